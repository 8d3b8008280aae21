//! Finder core: pure state machine, data model and view-model helpers.
mod effect;
mod failure;
mod msg;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{
    ClientError, ErrorClassifier, ErrorKind, RequestFailure, DEFAULT_API_BASE, FALLBACK_MESSAGE,
    TIMEOUT_MESSAGE,
};
pub use msg::Msg;
pub use state::{AppState, BulkForm, DispatchState, RequestKind, Tab};
pub use types::{
    parse_custom_patterns, BulkJob, BulkKind, BulkOptions, ConfidenceMode, EmailResult,
    EmailStatus, FindRequest, JobId, JobStatus, JobType, PollId, RequestTicket, SavedDownload,
    SubmitResponse, VerifyRequest, DEFAULT_MAX_RESULTS,
};
pub use update::{
    update, JOB_FAILED_FALLBACK, MISSING_FILE_MESSAGE, MISSING_JOB_ID_MESSAGE, NOT_READY_MESSAGE,
    NO_JOB_MESSAGE,
};
pub use view_model::{AppViewModel, BulkJobView};
