use std::path::PathBuf;

use crate::{
    BulkJob, BulkKind, BulkOptions, EmailResult, FindRequest, PollId, RequestFailure,
    RequestTicket, SavedDownload, SubmitResponse, Tab, VerifyRequest,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User switched between the find, verify and bulk panels.
    TabSelected(Tab),
    /// User submitted the single-person find form.
    FindSubmitted(FindRequest),
    /// User submitted the single-address verify form.
    VerifySubmitted(VerifyRequest),
    /// Engine finished a find dispatch.
    FindCompleted {
        ticket: RequestTicket,
        result: Result<Vec<EmailResult>, RequestFailure>,
    },
    /// Engine finished a verify dispatch.
    VerifyCompleted {
        ticket: RequestTicket,
        result: Result<EmailResult, RequestFailure>,
    },
    /// User picked (or unpicked) the CSV to upload.
    CsvFileSelected(Option<PathBuf>),
    /// User chose whether the CSV holds find or verify rows.
    CsvTypeSelected(BulkKind),
    BulkOptionsChanged(BulkOptions),
    /// User clicked the bulk upload button.
    BulkSubmitClicked,
    /// Engine finished uploading the CSV.
    BulkSubmitted(Result<SubmitResponse, RequestFailure>),
    /// Engine fetched a status snapshot for a poll generation.
    JobPolled {
        poll: PollId,
        result: Result<BulkJob, RequestFailure>,
    },
    DownloadClicked,
    DownloadFinished(Result<SavedDownload, RequestFailure>),
    /// User dismissed the tracked bulk job.
    ClearJobClicked,
    /// The consumer is going away; stop all background work.
    Teardown,
}
