//! Pipeline entry points.
//!
//! - `run_fetch`: Fetch subscribed sources into the stored notification list
//! - `calculate_diff`: Find notices missing from a previous snapshot

pub mod diff;
pub mod fetch;

pub use diff::{DiffResult, calculate_diff};
pub use fetch::{FetchSummary, run_fetch};
