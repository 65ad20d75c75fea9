use crate::error::Result;
use engram_snapshot::config::ensure_parent_dir;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Per-connection settings. `journal_mode` persists in the file; `synchronous`
/// has to be applied to every new connection.
const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;";

/// Open a pool on the database file, creating the file and its parent
/// directories when missing.
pub fn create_pool(db_path: &Path) -> Result<DbPool> {
    ensure_parent_dir(db_path)?;

    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
    let pool = Pool::builder().max_size(4).build(manager)?;

    tracing::debug!(db = %db_path.display(), "Opened database pool");
    Ok(pool)
}

pub fn close_pool(pool: &DbPool) {
    // r2d2 closes connections when the pool is dropped; fold the WAL back
    // into the main file first so a raw file copy sees recent writes.
    if let Ok(conn) = pool.get() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)");
    }
}
