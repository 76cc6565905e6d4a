use std::time::Duration;

use configs::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// 内存库只能有一个连接，否则每个连接各自一份空库
pub fn is_memory_url(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(cfg.url.clone());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    if is_memory_url(&cfg.url) {
        pin_single_connection(&mut opt);
    }
    tracing::debug!(backend = cfg.backend.as_str(), "connecting database");
    let db = Database::connect(opt).await?;
    Ok(db)
}

/// Private in-memory SQLite database, used for degraded mode and tests.
pub async fn connect_memory() -> anyhow::Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    pin_single_connection(&mut opt);
    opt.sqlx_logging(false);
    let db = Database::connect(opt).await?;
    Ok(db)
}

fn pin_single_connection(opt: &mut ConnectOptions) {
    let forever = Duration::from_secs(60 * 60 * 24 * 365);
    opt.max_connections(1)
        .min_connections(1)
        .idle_timeout(forever)
        .max_lifetime(forever);
}
