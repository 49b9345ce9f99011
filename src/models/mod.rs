// src/models/mod.rs

//! Domain models shared across the notice core.

mod config;
mod notification;
mod source;

// Re-export all public types
pub use config::{ChallengeConfig, Config, CrawlerConfig, LoggingConfig, StorageConfig};
pub use notification::{Notification, dedup, today};
pub use source::Source;
