pub mod alerts;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod fetcher;
pub mod models;
pub mod paginator;
pub mod scheduler;
pub mod selectors;
pub mod session;
pub mod site;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use utils::error::MonitorError;

pub type Result<T> = std::result::Result<T, MonitorError>;
