use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One model's result for a single prompt within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalResult {
    pub id: String,
    pub run_id: String,
    pub prompt_id: String,
    pub provider: String,
    pub model: String,
    pub params_hash: String,
    pub success: bool,
    pub score: Option<f64>,
    pub latency_ms: i64,
    pub fallback_depth: i64,
    pub error_code: Option<String>,
    pub output_ref: Option<String>,
    pub created_at_ms: i64,
}

/// The columns the daily scorecard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub latency_ms: i64,
    pub success: bool,
    pub fallback_depth: i64,
    pub created_at_ms: i64,
}

fn row_to_result(row: &Row) -> rusqlite::Result<EvalResult> {
    Ok(EvalResult {
        id: row.get("id")?,
        run_id: row.get("run_id")?,
        prompt_id: row.get("prompt_id")?,
        provider: row.get("provider")?,
        model: row.get("model")?,
        params_hash: row.get("params_hash")?,
        success: row.get("success")?,
        score: row.get("score")?,
        latency_ms: row.get("latency_ms")?,
        fallback_depth: row.get("fallback_depth")?,
        error_code: row.get("error_code")?,
        output_ref: row.get("output_ref")?,
        created_at_ms: row.get("created_at_ms")?,
    })
}

fn row_to_metrics(row: &Row) -> rusqlite::Result<ResultRow> {
    Ok(ResultRow {
        latency_ms: row.get("latency_ms")?,
        success: row.get("success")?,
        fallback_depth: row.get("fallback_depth")?,
        created_at_ms: row.get("created_at_ms")?,
    })
}

pub fn find_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<EvalResult>> {
    let mut stmt = conn.prepare("SELECT * FROM results WHERE id = ?")?;
    let mut rows = stmt.query_map(params![id], row_to_result)?;
    Ok(rows.next().transpose()?)
}

pub fn find_by_run_id(conn: &Connection, run_id: &str) -> anyhow::Result<Vec<EvalResult>> {
    let mut stmt =
        conn.prepare("SELECT * FROM results WHERE run_id = ? ORDER BY created_at_ms ASC")?;
    let rows = stmt.query_map(params![run_id], row_to_result)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Rows with `start_ms <= created_at_ms < end_ms`.
pub fn find_metrics_between(
    conn: &Connection,
    start_ms: i64,
    end_ms: i64,
) -> rusqlite::Result<Vec<ResultRow>> {
    let mut stmt = conn.prepare(
        "SELECT latency_ms, success, fallback_depth, created_at_ms
         FROM results
         WHERE created_at_ms >= ?1 AND created_at_ms < ?2",
    )?;
    let rows = stmt.query_map(params![start_ms, end_ms], row_to_metrics)?;
    rows.collect()
}

pub struct NewEvalResult {
    /// Generated when absent
    pub id: Option<String>,
    pub run_id: String,
    pub prompt_id: String,
    pub provider: String,
    pub model: String,
    pub params_hash: String,
    pub success: bool,
    pub score: Option<f64>,
    pub latency_ms: i64,
    pub fallback_depth: i64,
    pub error_code: Option<String>,
    pub output_ref: Option<String>,
    pub created_at_ms: i64,
}

pub fn create(conn: &Connection, data: &NewEvalResult) -> anyhow::Result<EvalResult> {
    let id = data
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    conn.execute(
        "INSERT INTO results (
            id, run_id, prompt_id, provider, model, params_hash, success, score,
            latency_ms, fallback_depth, error_code, output_ref, created_at_ms
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            data.run_id,
            data.prompt_id,
            data.provider,
            data.model,
            data.params_hash,
            data.success,
            data.score,
            data.latency_ms,
            data.fallback_depth,
            data.error_code,
            data.output_ref,
            data.created_at_ms
        ],
    )?;
    find_by_id(conn, &id)?.ok_or_else(|| anyhow::anyhow!("Failed to retrieve created result"))
}
