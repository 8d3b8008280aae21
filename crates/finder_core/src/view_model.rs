use crate::{
    BulkForm, BulkJob, EmailResult, JobId, JobStatus, JobType, RequestKind, SavedDownload, Tab,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub tab: Tab,
    pub loading: Option<RequestKind>,
    /// Which request produced `results`; `None` while idle or loading.
    pub results_for: Option<RequestKind>,
    pub results: Vec<EmailResult>,
    pub error: Option<String>,
    pub bulk_form: BulkForm,
    pub bulk_submitting: bool,
    pub job: Option<BulkJobView>,
    pub polling: bool,
    pub can_download: bool,
    pub can_clear: bool,
    pub last_download: Option<SavedDownload>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkJobView {
    pub job_id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    /// Clamped to 0..=100 for display.
    pub progress: f64,
    pub total_rows: u64,
    pub processed_rows: u64,
    pub success_rows: u64,
    pub error_rows: u64,
    pub message: Option<String>,
    pub recent_errors: Vec<String>,
}

impl From<&BulkJob> for BulkJobView {
    fn from(job: &BulkJob) -> Self {
        let progress = if job.progress.is_finite() {
            job.progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            job_id: job.id.clone(),
            job_type: job.job_type,
            status: job.status,
            progress,
            total_rows: job.total_rows,
            processed_rows: job.processed_rows,
            success_rows: job.success_rows,
            error_rows: job.error_rows,
            message: job.message.clone(),
            recent_errors: job.recent_errors.clone(),
        }
    }
}
