#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Invalid UTC date format: {0}")]
    InvalidDate(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error(transparent)]
    Snapshot(#[from] engram_snapshot::SnapshotError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
