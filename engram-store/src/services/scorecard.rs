//! Daily aggregate metrics over stored results.

use crate::error::{Result, StoreError};
use crate::models::eval_result::{self, ResultRow};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Percentile reported as `p95LatencyMs`.
const P95: f64 = 0.95;

/// Aggregate metrics for one UTC day. Recomputed on every call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyScorecard {
    pub avg_latency_ms: f64,
    pub date: String,
    pub fallback_rate: f64,
    pub p95_latency_ms: i64,
    pub success_rate: f64,
    pub total: usize,
}

impl DailyScorecard {
    fn empty(date: &str) -> Self {
        Self {
            avg_latency_ms: 0.0,
            date: date.to_string(),
            fallback_rate: 0.0,
            p95_latency_ms: 0,
            success_rate: 0.0,
            total: 0,
        }
    }
}

/// Anything that can answer a created-at range query over result rows.
pub trait ResultSource {
    /// Rows with `start_ms <= created_at_ms < end_ms`, in any order.
    fn rows_between(&self, start_ms: i64, end_ms: i64) -> Result<Vec<ResultRow>>;
}

impl ResultSource for Connection {
    fn rows_between(&self, start_ms: i64, end_ms: i64) -> Result<Vec<ResultRow>> {
        Ok(eval_result::find_metrics_between(self, start_ms, end_ms)?)
    }
}

impl ResultSource for [ResultRow] {
    fn rows_between(&self, start_ms: i64, end_ms: i64) -> Result<Vec<ResultRow>> {
        Ok(self
            .iter()
            .filter(|r| r.created_at_ms >= start_ms && r.created_at_ms < end_ms)
            .copied()
            .collect())
    }
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_utc_date(date: &str) -> Result<NaiveDate> {
    let bytes = date.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(StoreError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| StoreError::InvalidDate(date.to_string()))
}

/// Epoch-millisecond bounds `[start, end)` of a UTC day.
pub fn day_window(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    (start, start + DAY_MS)
}

/// Nearest-rank percentile over ascending values: index `floor(n * q)`,
/// clamped to the last element. No interpolation.
pub fn nearest_rank(sorted: &[i64], q: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    let index = ((sorted.len() as f64 * q).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Build the scorecard for results created on `date` (UTC).
pub fn build_daily_scorecard<S: ResultSource + ?Sized>(
    store: &S,
    date: &str,
) -> Result<DailyScorecard> {
    let (day_start, day_end) = day_window(parse_utc_date(date)?);
    tracing::debug!(date, day_start, day_end, "Building daily scorecard");

    let rows = store.rows_between(day_start, day_end)?;
    if rows.is_empty() {
        return Ok(DailyScorecard::empty(date));
    }

    let total = rows.len();
    let mut latencies: Vec<i64> = rows.iter().map(|r| r.latency_ms).collect();
    latencies.sort_unstable();

    let total_latency: f64 = latencies.iter().map(|&v| v as f64).sum();
    let success_count = rows.iter().filter(|r| r.success).count();
    let fallback_count = rows.iter().filter(|r| r.fallback_depth > 0).count();

    Ok(DailyScorecard {
        avg_latency_ms: total_latency / total as f64,
        date: date.to_string(),
        fallback_rate: fallback_count as f64 / total as f64,
        p95_latency_ms: nearest_rank(&latencies, P95),
        success_rate: success_count as f64 / total as f64,
        total,
    })
}
