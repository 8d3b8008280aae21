use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use finder_core::{
    BulkKind, BulkOptions, FindRequest, JobId, PollId, RequestFailure, RequestTicket,
    SavedDownload, VerifyRequest,
};
use finder_logging::{finder_debug, finder_info, finder_warn};
use thiserror::Error;

use crate::disposition::safe_download_name;
use crate::poller::{ChannelEventSink, EventSink, JobPoller};
use crate::{
    ApiSettings, AtomicFileWriter, ConfigError, CsvUpload, EngineEvent, FinderApi, ReqwestApi,
};

enum EngineCommand {
    Find {
        ticket: RequestTicket,
        request: FindRequest,
    },
    Verify {
        ticket: RequestTicket,
        request: VerifyRequest,
    },
    SubmitBulk {
        kind: BulkKind,
        file: PathBuf,
        options: BulkOptions,
    },
    StartPolling {
        job_id: JobId,
        poll: PollId,
    },
    CancelPolling {
        poll: PollId,
    },
    Download {
        job_id: JobId,
    },
    Shutdown,
}

/// The engine thread is gone; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread stopped unexpectedly")]
pub struct EngineStopped;

/// Runs all IO on a dedicated tokio runtime thread. Dropping the handle
/// cancels any live poll loop and stops the thread.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings, output_dir: PathBuf) -> Result<Self, ConfigError> {
        let poll_interval = settings.poll_interval;
        let api: Arc<dyn FinderApi> = Arc::new(ReqwestApi::new(settings)?);
        Ok(Self::with_api(api, poll_interval, output_dir))
    }

    pub fn with_api(api: Arc<dyn FinderApi>, poll_interval: Duration, output_dir: PathBuf) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let _context = runtime.enter();
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let writer = Arc::new(AtomicFileWriter::new(output_dir));
            let mut poller = JobPoller::new(api.clone(), sink.clone(), poll_interval);

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { job_id, poll } => poller.start(job_id, poll),
                    EngineCommand::CancelPolling { poll } => poller.cancel(poll),
                    EngineCommand::Shutdown => break,
                    command => {
                        let api = api.clone();
                        let sink = sink.clone();
                        let writer = writer.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), &writer, command, sink.as_ref()).await;
                        });
                    }
                }
            }
            poller.cancel_all();
            finder_info!("Engine thread stopped");
        });

        Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        }
    }

    pub fn find(&self, ticket: RequestTicket, request: FindRequest) {
        self.send(EngineCommand::Find { ticket, request });
    }

    pub fn verify(&self, ticket: RequestTicket, request: VerifyRequest) {
        self.send(EngineCommand::Verify { ticket, request });
    }

    pub fn submit_bulk(&self, kind: BulkKind, file: PathBuf, options: BulkOptions) {
        self.send(EngineCommand::SubmitBulk {
            kind,
            file,
            options,
        });
    }

    pub fn start_polling(&self, job_id: JobId, poll: PollId) {
        self.send(EngineCommand::StartPolling { job_id, poll });
    }

    pub fn cancel_polling(&self, poll: PollId) {
        self.send(EngineCommand::CancelPolling { poll });
    }

    pub fn download(&self, job_id: JobId) {
        self.send(EngineCommand::Download { job_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Ok(None)` when nothing arrived within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            finder_warn!("Engine thread is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

async fn handle_command(
    api: &dyn FinderApi,
    writer: &AtomicFileWriter,
    command: EngineCommand,
    sink: &dyn EventSink,
) {
    match command {
        EngineCommand::Find { ticket, request } => {
            let result = api.find(&request).await;
            finder_debug!("Find {:?} finished ok={}", ticket, result.is_ok());
            sink.emit(EngineEvent::FindFinished { ticket, result });
        }
        EngineCommand::Verify { ticket, request } => {
            let result = api.verify(&request).await;
            finder_debug!("Verify {:?} finished ok={}", ticket, result.is_ok());
            sink.emit(EngineEvent::VerifyFinished { ticket, result });
        }
        EngineCommand::SubmitBulk {
            kind,
            file,
            options,
        } => {
            let result = match read_upload(&file).await {
                Ok(upload) => api.submit_bulk(kind, upload, options).await,
                Err(failure) => Err(failure),
            };
            if let Err(failure) = &result {
                finder_warn!("Bulk submission of {} failed: {}", file.display(), failure);
            }
            sink.emit(EngineEvent::BulkSubmitted(result));
        }
        EngineCommand::Download { job_id } => {
            let result = match api.download(&job_id).await {
                Ok(payload) => {
                    let name = safe_download_name(payload.suggested_name.as_deref());
                    save_download(writer.clone(), name, payload.bytes).await
                }
                Err(failure) => Err(failure),
            };
            match &result {
                Ok(saved) => finder_info!(
                    "Saved results of job {} to {} ({} bytes)",
                    job_id,
                    saved.path.display(),
                    saved.bytes
                ),
                Err(failure) => finder_warn!("Download of job {} failed: {}", job_id, failure),
            }
            sink.emit(EngineEvent::DownloadFinished(result));
        }
        EngineCommand::StartPolling { .. }
        | EngineCommand::CancelPolling { .. }
        | EngineCommand::Shutdown => {}
    }
}

async fn read_upload(file: &Path) -> Result<CsvUpload, RequestFailure> {
    let bytes = tokio::fs::read(file).await.map_err(|err| {
        RequestFailure::Other(Some(format!("Could not read {}: {err}", file.display())))
    })?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());
    Ok(CsvUpload { file_name, bytes })
}

async fn save_download(
    writer: AtomicFileWriter,
    name: String,
    bytes: Vec<u8>,
) -> Result<SavedDownload, RequestFailure> {
    let len = bytes.len() as u64;
    let written = tokio::task::spawn_blocking(move || writer.write(&name, &bytes)).await;
    match written {
        Ok(Ok(path)) => Ok(SavedDownload { path, bytes: len }),
        Ok(Err(err)) => Err(RequestFailure::Other(Some(format!(
            "Could not save results: {err}"
        )))),
        Err(err) => Err(RequestFailure::Other(Some(format!(
            "Could not save results: {err}"
        )))),
    }
}
