pub mod core;
pub mod error;
pub mod models;
pub mod progress;

pub use core::DownloadCore;
pub use error::DownloadError;
pub use models::{BatchResult, DownloadBatch, DownloadTask, FailedTask, TaskStatus};
pub use progress::{BarProgress, CountingProgress, ProgressSink};
