//! Engram result store
//!
//! SQLite persistence for evaluation results, daily scorecards and output
//! scoring. Snapshot backup lives in `engram-snapshot`.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use error::{Result, StoreError};
pub use services::scorecard::{build_daily_scorecard, DailyScorecard, ResultSource};
