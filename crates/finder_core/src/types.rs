use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_MAX_RESULTS: u32 = 2;

/// Opaque job identifier as issued by the server.
pub type JobId = String;

/// Generation counter for polling sessions. A poll result is only applied
/// while its generation is the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PollId(pub u64);

/// Identifies one find/verify dispatch; stale completions are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceMode {
    #[default]
    Balanced,
    Aggressive,
}

impl ConfidenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceMode::Balanced => "balanced",
            ConfidenceMode::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for ConfidenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindRequest {
    pub first_name: String,
    pub last_name: String,
    pub domain: String,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_patterns: Option<u32>,
    pub include_default_patterns: bool,
    pub fast_mode: bool,
    pub confidence_mode: ConfidenceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_patterns: Option<Vec<String>>,
}

impl FindRequest {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            domain: domain.into(),
            max_results: DEFAULT_MAX_RESULTS,
            max_patterns: None,
            include_default_patterns: true,
            fast_mode: false,
            confidence_mode: ConfidenceMode::default(),
            custom_patterns: None,
        }
    }

    /// Sets the custom patterns from free-form text, one pattern per line.
    /// Blank input leaves the field out of the payload entirely.
    pub fn with_custom_patterns_text(mut self, raw: &str) -> Self {
        let patterns = parse_custom_patterns(raw);
        self.custom_patterns = if patterns.is_empty() {
            None
        } else {
            Some(patterns)
        };
        self
    }
}

pub fn parse_custom_patterns(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyRequest {
    pub email: String,
    pub fast_mode: bool,
    pub confidence_mode: ConfidenceMode,
}

impl VerifyRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            fast_mode: false,
            confidence_mode: ConfidenceMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailStatus {
    #[serde(rename = "valid")]
    Valid,
    #[serde(rename = "invalid")]
    Invalid,
    #[serde(rename = "catch-all")]
    CatchAll,
    #[serde(rename = "not_found")]
    NotFound,
    #[serde(rename = "error")]
    Error,
    /// Also catches any status this client does not know yet.
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EmailStatus::Valid => "valid",
            EmailStatus::Invalid => "invalid",
            EmailStatus::CatchAll => "catch-all",
            EmailStatus::Unknown => "unknown",
            EmailStatus::NotFound => "not_found",
            EmailStatus::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    pub status: EmailStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Server diagnostics; passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which kind of CSV a bulk submission carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkKind {
    #[default]
    Find,
    Verify,
}

impl BulkKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            BulkKind::Find => "/api/bulk-find",
            BulkKind::Verify => "/api/bulk-verify",
        }
    }

    pub fn job_type(self) -> JobType {
        match self {
            BulkKind::Find => JobType::BulkFind,
            BulkKind::Verify => JobType::BulkVerify,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkOptions {
    pub fast_mode: bool,
    pub confidence_mode: ConfidenceMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    BulkFind,
    BulkVerify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkJob {
    #[serde(deserialize_with = "job_id_from_wire")]
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub processed_rows: u64,
    #[serde(default)]
    pub success_rows: u64,
    #[serde(default)]
    pub error_rows: u64,
    #[serde(default)]
    pub download_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub recent_errors: Vec<String>,
}

impl BulkJob {
    /// Local stand-in stored between submission and the first poll.
    pub fn placeholder(id: JobId, kind: BulkKind, total_rows: u64) -> Self {
        Self {
            id,
            job_type: kind.job_type(),
            status: JobStatus::Pending,
            progress: if total_rows > 0 { 0.0 } else { 100.0 },
            total_rows,
            processed_rows: 0,
            success_rows: 0,
            error_rows: 0,
            download_ready: false,
            message: None,
            recent_errors: Vec::new(),
        }
    }
}

/// Body of a successful bulk submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, deserialize_with = "optional_job_id_from_wire")]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub total_rows: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireJobId {
    Text(String),
    Number(u64),
}

impl From<WireJobId> for JobId {
    fn from(raw: WireJobId) -> Self {
        match raw {
            WireJobId::Text(text) => text,
            WireJobId::Number(n) => n.to_string(),
        }
    }
}

fn job_id_from_wire<'de, D>(deserializer: D) -> Result<JobId, D::Error>
where
    D: Deserializer<'de>,
{
    WireJobId::deserialize(deserializer).map(JobId::from)
}

fn optional_job_id_from_wire<'de, D>(deserializer: D) -> Result<Option<JobId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<WireJobId>::deserialize(deserializer)?;
    Ok(raw.map(JobId::from).filter(|id| !id.is_empty()))
}

/// Result of a bulk download that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDownload {
    pub path: PathBuf,
    pub bytes: u64,
}
