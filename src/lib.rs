// src/lib.rs

//! XJTU notice subscription and filtering core.

pub mod challenge;
pub mod crawlers;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod services;
pub mod storage;
pub mod utils;
