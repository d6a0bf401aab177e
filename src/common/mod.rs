pub mod client;
pub mod error;
pub mod logger;
pub mod models;
