use crate::{
    AppState, BulkJob, BulkKind, ClientError, Effect, ErrorKind, JobStatus, Msg, RequestKind,
    SubmitResponse,
};

pub const MISSING_FILE_MESSAGE: &str = "Please select a CSV file";
pub const MISSING_JOB_ID_MESSAGE: &str = "Job ID missing from server response";
pub const JOB_FAILED_FALLBACK: &str = "Bulk job failed. Please try again.";
pub const NO_JOB_MESSAGE: &str = "No completed job to download.";
pub const NOT_READY_MESSAGE: &str = "Results are not ready for download yet.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::TabSelected(tab) => {
            state.set_tab(tab);
            Vec::new()
        }
        Msg::FindSubmitted(request) => {
            let ticket = state.begin_dispatch(RequestKind::Find);
            vec![Effect::Find { ticket, request }]
        }
        Msg::VerifySubmitted(request) => {
            let ticket = state.begin_dispatch(RequestKind::Verify);
            vec![Effect::Verify { ticket, request }]
        }
        Msg::FindCompleted { ticket, result } => {
            if state.is_current_dispatch(ticket) {
                state.finish_dispatch(RequestKind::Find, result);
            }
            Vec::new()
        }
        Msg::VerifyCompleted { ticket, result } => {
            if state.is_current_dispatch(ticket) {
                // Single result is wrapped so both lanes render the same way.
                state.finish_dispatch(RequestKind::Verify, result.map(|one| vec![one]));
            }
            Vec::new()
        }
        Msg::CsvFileSelected(file) => {
            state.bulk_form_mut().file = file;
            Vec::new()
        }
        Msg::CsvTypeSelected(kind) => {
            state.bulk_form_mut().kind = kind;
            Vec::new()
        }
        Msg::BulkOptionsChanged(options) => {
            state.bulk_form_mut().options = options;
            Vec::new()
        }
        Msg::BulkSubmitClicked => submit_bulk(&mut state),
        Msg::BulkSubmitted(result) => {
            let Some(kind) = state.finish_submission() else {
                return (state, Vec::new());
            };
            match result {
                Ok(response) => accept_submission(&mut state, kind, response),
                Err(failure) => {
                    state.set_failure(&failure);
                    Vec::new()
                }
            }
        }
        Msg::JobPolled { poll, result } => {
            if state.active_poll() != Some(poll) {
                // Tick from a superseded or stopped generation.
                return (state, Vec::new());
            }
            match result {
                Ok(job) => apply_snapshot(&mut state, job),
                Err(failure) => {
                    // Last snapshot stays visible; only polling stops.
                    state.set_failure(&failure);
                    cancel_active_poll(&mut state)
                }
            }
        }
        Msg::DownloadClicked => {
            let guard = match state.job() {
                None => Err(NO_JOB_MESSAGE),
                Some(job) if !job.download_ready => Err(NOT_READY_MESSAGE),
                Some(job) => Ok(job.id.clone()),
            };
            match guard {
                Ok(job_id) => {
                    state.clear_error();
                    vec![Effect::Download { job_id }]
                }
                Err(reason) => {
                    state.set_error(ClientError::validation(reason));
                    Vec::new()
                }
            }
        }
        Msg::DownloadFinished(result) => {
            match result {
                Ok(saved) => state.set_last_download(saved),
                Err(failure) => state.set_failure(&failure),
            }
            Vec::new()
        }
        Msg::ClearJobClicked => {
            if state.can_clear_job() {
                state.clear_job();
            }
            Vec::new()
        }
        Msg::Teardown => cancel_active_poll(&mut state),
    };

    (state, effects)
}

fn submit_bulk(state: &mut AppState) -> Vec<Effect> {
    if state.is_submitting() {
        return Vec::new();
    }
    let form = state.bulk_form().clone();
    let Some(file) = form.file else {
        state.set_error(ClientError::validation(MISSING_FILE_MESSAGE));
        return Vec::new();
    };
    state.clear_error();
    state.begin_submission(form.kind);
    vec![Effect::SubmitBulk {
        kind: form.kind,
        file,
        options: form.options,
    }]
}

fn accept_submission(
    state: &mut AppState,
    kind: BulkKind,
    response: SubmitResponse,
) -> Vec<Effect> {
    let Some(job_id) = response.job_id else {
        state.set_error(ClientError::malformed(MISSING_JOB_ID_MESSAGE));
        return Vec::new();
    };

    // The old generation must be dead before the placeholder lands.
    let mut effects = cancel_active_poll(state);
    let placeholder = BulkJob::placeholder(job_id.clone(), kind, response.total_rows.unwrap_or(0));
    let poll = state.track_new_job(placeholder);
    effects.push(Effect::StartPolling { job_id, poll });
    effects
}

fn apply_snapshot(state: &mut AppState, job: BulkJob) -> Vec<Effect> {
    let status = job.status;
    let message = job.message.clone();
    state.replace_job(job);

    if !status.is_terminal() {
        return Vec::new();
    }
    if status == JobStatus::Failed {
        let reason = message
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| JOB_FAILED_FALLBACK.to_string());
        state.set_error(ClientError::new(ErrorKind::ServerRejected, reason));
    }
    cancel_active_poll(state)
}

fn cancel_active_poll(state: &mut AppState) -> Vec<Effect> {
    match state.stop_polling() {
        Some(poll) => vec![Effect::CancelPolling { poll }],
        None => Vec::new(),
    }
}
