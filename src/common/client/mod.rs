pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::HttpClient;
pub use error::TransportError;
pub use models::{ByteStream, FetchResponse, ResourceInfo};
pub use transport::Transport;
