pub mod common;
pub mod downloader;
pub mod parser;
pub mod post_process;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
