use std::path::PathBuf;

use crate::{BulkKind, BulkOptions, FindRequest, JobId, PollId, RequestTicket, VerifyRequest};

/// Side effects requested by `update`; executed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
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
    /// Replace whatever poll loop is running with a new one for `job_id`.
    StartPolling { job_id: JobId, poll: PollId },
    CancelPolling { poll: PollId },
    Download { job_id: JobId },
}
