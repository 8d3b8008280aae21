//! Finder engine: HTTP transport, job polling and effect execution.
mod client;
mod disposition;
mod engine;
mod persist;
mod poller;
mod types;

pub use client::{ApiSettings, ConfigError, FinderApi, ReqwestApi};
pub use disposition::{filename_from_disposition, safe_download_name, DEFAULT_DOWNLOAD_NAME};
pub use engine::{EngineHandle, EngineStopped};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use poller::{spawn_poll_loop, ChannelEventSink, EventSink, JobPoller, PollHandle};
pub use types::{CsvUpload, DownloadPayload, EngineEvent};
