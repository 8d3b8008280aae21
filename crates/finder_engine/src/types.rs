use finder_core::{
    BulkJob, EmailResult, PollId, RequestFailure, RequestTicket, SavedDownload, SubmitResponse,
};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    FindFinished {
        ticket: RequestTicket,
        result: Result<Vec<EmailResult>, RequestFailure>,
    },
    VerifyFinished {
        ticket: RequestTicket,
        result: Result<EmailResult, RequestFailure>,
    },
    BulkSubmitted(Result<SubmitResponse, RequestFailure>),
    JobPolled {
        poll: PollId,
        result: Result<BulkJob, RequestFailure>,
    },
    DownloadFinished(Result<SavedDownload, RequestFailure>),
}

/// A CSV read from disk, ready for the multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Raw result file as served by the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPayload {
    pub bytes: Vec<u8>,
    /// Name suggested by `content-disposition`, unsanitized.
    pub suggested_name: Option<String>,
}
