//! Service layer for the notice core.
//!
//! This module contains the business logic for:
//! - Subscriptions, rulesets and fetch orchestration (`NotificationManager`)
//! - The stored notification list (`inbox`)

pub mod inbox;
mod manager;

pub use inbox::{SortOrder, SourceOrder};
pub use manager::NotificationManager;
