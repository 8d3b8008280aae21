use std::sync::Arc;
use std::time::Duration;

use finder_core::{JobId, PollId};
use finder_logging::{finder_debug, finder_info, finder_warn};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, FinderApi};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// A running poll loop. Cancelling is idempotent, and dropping the handle
/// cancels it, so a loop can never outlive its owner.
#[derive(Debug)]
pub struct PollHandle {
    poll: PollId,
    job_id: JobId,
    token: CancellationToken,
}

impl PollHandle {
    pub fn poll(&self) -> PollId {
        self.poll
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            finder_info!("Cancelling poll {:?} for job {}", self.poll, self.job_id);
            self.token.cancel();
        }
    }

    /// True once cancelled or once the loop has stopped by itself.
    pub fn is_finished(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawns a loop that fetches the job status every `period`, first tick one
/// period from now. The loop ends on a terminal status, on the first fetch
/// error, or when the handle is cancelled. Must be called inside a runtime.
pub fn spawn_poll_loop(
    api: Arc<dyn FinderApi>,
    sink: Arc<dyn EventSink>,
    job_id: JobId,
    poll: PollId,
    period: Duration,
) -> PollHandle {
    let token = CancellationToken::new();
    finder_info!("Starting poll {:?} for job {} every {:?}", poll, job_id, period);
    tokio::spawn(run_poll_loop(
        api,
        sink,
        job_id.clone(),
        poll,
        period,
        token.clone(),
    ));
    PollHandle {
        poll,
        job_id,
        token,
    }
}

async fn run_poll_loop(
    api: Arc<dyn FinderApi>,
    sink: Arc<dyn EventSink>,
    job_id: JobId,
    poll: PollId,
    period: Duration,
    token: CancellationToken,
) {
    // Marks the handle finished however the loop exits.
    let _finished = token.clone().drop_guard();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            () = token.cancelled() => break,
            result = api.job_status(&job_id) => result,
        };
        if token.is_cancelled() {
            break;
        }

        let stop = match &result {
            Ok(job) => {
                finder_debug!(
                    "Poll {:?} job {} status={} progress={:.1}",
                    poll,
                    job_id,
                    job.status,
                    job.progress
                );
                job.status.is_terminal()
            }
            Err(failure) => {
                finder_warn!("Poll {:?} job {} failed: {}", poll, job_id, failure);
                true
            }
        };
        sink.emit(EngineEvent::JobPolled { poll, result });
        if stop {
            finder_info!("Poll {:?} for job {} stopped", poll, job_id);
            break;
        }
    }
}

/// Owns the single live poll loop.
pub struct JobPoller {
    api: Arc<dyn FinderApi>,
    sink: Arc<dyn EventSink>,
    period: Duration,
    current: Option<PollHandle>,
}

impl JobPoller {
    pub fn new(api: Arc<dyn FinderApi>, sink: Arc<dyn EventSink>, period: Duration) -> Self {
        Self {
            api,
            sink,
            period,
            current: None,
        }
    }

    /// Cancels whatever loop is running, then starts one for `job_id`.
    pub fn start(&mut self, job_id: JobId, poll: PollId) {
        self.cancel_all();
        self.current = Some(spawn_poll_loop(
            self.api.clone(),
            self.sink.clone(),
            job_id,
            poll,
            self.period,
        ));
    }

    /// Cancels the loop only if it belongs to `poll`.
    pub fn cancel(&mut self, poll: PollId) {
        if self.current.as_ref().is_some_and(|handle| handle.poll() == poll) {
            self.cancel_all();
        }
    }

    pub fn cancel_all(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    pub fn active_poll(&self) -> Option<PollId> {
        self.current
            .as_ref()
            .filter(|handle| !handle.is_finished())
            .map(PollHandle::poll)
    }
}
