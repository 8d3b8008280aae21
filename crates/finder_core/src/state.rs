use std::path::PathBuf;

use crate::view_model::{AppViewModel, BulkJobView};
use crate::{
    BulkJob, BulkKind, BulkOptions, ClientError, EmailResult, ErrorClassifier, JobStatus, PollId,
    RequestFailure, RequestTicket, SavedDownload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Find,
    Verify,
    Bulk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Find,
    Verify,
}

/// The single-request lane. Loading and results cannot coexist, and the
/// error slot is emptied whenever this enters `Loading`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Loading {
        kind: RequestKind,
        ticket: RequestTicket,
    },
    Results {
        kind: RequestKind,
        results: Vec<EmailResult>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkForm {
    pub file: Option<PathBuf>,
    pub kind: BulkKind,
    pub options: BulkOptions,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    classifier: ErrorClassifier,
    tab: Tab,
    dispatch: DispatchState,
    error: Option<ClientError>,
    bulk_form: BulkForm,
    bulk_submitting: Option<BulkKind>,
    job: Option<BulkJob>,
    active_poll: Option<PollId>,
    last_download: Option<SavedDownload>,
    next_ticket: u64,
    next_poll: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State whose connectivity messages name `base_url`.
    pub fn with_api_base(base_url: impl Into<String>) -> Self {
        Self {
            classifier: ErrorClassifier::new(base_url),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let (loading, results_for, results) = match &self.dispatch {
            DispatchState::Idle => (None, None, Vec::new()),
            DispatchState::Loading { kind, .. } => (Some(*kind), None, Vec::new()),
            DispatchState::Results { kind, results } => (None, Some(*kind), results.clone()),
        };
        AppViewModel {
            tab: self.tab,
            loading,
            results_for,
            results,
            error: self.error.as_ref().map(|err| err.message.clone()),
            bulk_form: self.bulk_form.clone(),
            bulk_submitting: self.bulk_submitting.is_some(),
            job: self.job.as_ref().map(BulkJobView::from),
            polling: self.active_poll.is_some(),
            can_download: self.job.as_ref().is_some_and(|job| job.download_ready),
            can_clear: self.can_clear_job(),
            last_download: self.last_download.clone(),
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn dispatch(&self) -> &DispatchState {
        &self.dispatch
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub fn job(&self) -> Option<&BulkJob> {
        self.job.as_ref()
    }

    pub fn active_poll(&self) -> Option<PollId> {
        self.active_poll
    }

    pub fn bulk_form(&self) -> &BulkForm {
        &self.bulk_form
    }

    pub fn is_submitting(&self) -> bool {
        self.bulk_submitting.is_some()
    }

    pub fn last_download(&self) -> Option<&SavedDownload> {
        self.last_download.as_ref()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_error(&mut self, error: ClientError) {
        self.error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn set_failure(&mut self, failure: &RequestFailure) {
        let error = self.classifier.classify(failure);
        self.set_error(error);
    }

    pub(crate) fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Clears prior results and error, then enters `Loading` for a new ticket.
    pub(crate) fn begin_dispatch(&mut self, kind: RequestKind) -> RequestTicket {
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        self.error = None;
        self.dispatch = DispatchState::Loading { kind, ticket };
        self.mark_dirty();
        ticket
    }

    /// Returns true when `ticket` is the dispatch currently loading.
    pub(crate) fn is_current_dispatch(&self, ticket: RequestTicket) -> bool {
        matches!(self.dispatch, DispatchState::Loading { ticket: current, .. } if current == ticket)
    }

    pub(crate) fn finish_dispatch(
        &mut self,
        kind: RequestKind,
        result: Result<Vec<EmailResult>, RequestFailure>,
    ) {
        match result {
            Ok(results) => {
                self.dispatch = DispatchState::Results { kind, results };
                self.mark_dirty();
            }
            Err(failure) => {
                self.dispatch = DispatchState::Idle;
                self.set_failure(&failure);
            }
        }
    }

    pub(crate) fn bulk_form_mut(&mut self) -> &mut BulkForm {
        self.mark_dirty();
        &mut self.bulk_form
    }

    pub(crate) fn begin_submission(&mut self, kind: BulkKind) {
        self.bulk_submitting = Some(kind);
        self.mark_dirty();
    }

    /// Ends the in-flight upload, returning the kind it was submitted as.
    pub(crate) fn finish_submission(&mut self) -> Option<BulkKind> {
        let kind = self.bulk_submitting.take();
        if kind.is_some() {
            self.mark_dirty();
        }
        kind
    }

    /// Stores a fresh placeholder and returns the new poll generation.
    pub(crate) fn track_new_job(&mut self, job: BulkJob) -> PollId {
        self.next_poll += 1;
        let poll = PollId(self.next_poll);
        self.job = Some(job);
        self.active_poll = Some(poll);
        self.last_download = None;
        self.bulk_form.file = None;
        self.error = None;
        self.mark_dirty();
        poll
    }

    pub(crate) fn replace_job(&mut self, job: BulkJob) {
        self.job = Some(job);
        self.mark_dirty();
    }

    /// Forgets the active poll generation, returning it if there was one.
    pub(crate) fn stop_polling(&mut self) -> Option<PollId> {
        let poll = self.active_poll.take();
        if poll.is_some() {
            self.mark_dirty();
        }
        poll
    }

    pub(crate) fn set_last_download(&mut self, download: SavedDownload) {
        self.last_download = Some(download);
        self.mark_dirty();
    }

    pub(crate) fn can_clear_job(&self) -> bool {
        match &self.job {
            Some(job) => !matches!(job.status, JobStatus::Pending | JobStatus::Running),
            None => false,
        }
    }

    pub(crate) fn clear_job(&mut self) {
        self.job = None;
        self.last_download = None;
        self.mark_dirty();
    }
}
