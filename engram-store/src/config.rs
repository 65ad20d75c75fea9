use engram_snapshot::StoragePaths;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: StoragePaths,
    pub log_level: String,
}

impl AppConfig {
    /// Read configuration from the process environment (and `.env`, if any).
    ///
    /// This is the only place environment variables are consulted; everything
    /// downstream receives the resolved paths.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let data_dir = std::env::var("ENGRAM_DATA_DIR").ok();
        let db_path = std::env::var("ENGRAM_DB_PATH").ok();
        let home = dirs::home_dir();

        Ok(Self {
            paths: StoragePaths::resolve(data_dir.as_deref(), db_path.as_deref(), home.as_deref())?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        })
    }
}
