//! Open the configured storage backend, degrading to in-memory collections on failure.

use std::path::PathBuf;
use std::sync::Arc;

use configs::{DatabaseConfig, StorageBackend};
use migration::MigratorTrait;
use models::db;
use tracing::{info, warn};

use crate::repo::{CollectionsRepository, MarketRepository, SeaOrmRepository};
use crate::seed;

pub struct Backend {
    pub repo: Arc<dyn MarketRepository>,
    pub kind: StorageBackend,
    /// 启动时数据库不可用，运行在内存库上
    pub degraded: bool,
}

/// Only fails when even the in-memory fallback cannot be opened.
pub async fn open_backend(cfg: &DatabaseConfig) -> anyhow::Result<Backend> {
    match try_open(cfg).await {
        Ok(repo) => {
            info!(backend = cfg.backend.as_str(), "storage backend ready");
            Ok(Backend { repo, kind: cfg.backend, degraded: false })
        }
        Err(e) => {
            warn!(backend = cfg.backend.as_str(), error = %e, "database unavailable; running degraded in-memory store");
            let repo = open_degraded().await?;
            Ok(Backend { repo, kind: StorageBackend::Collections, degraded: true })
        }
    }
}

async fn try_open(cfg: &DatabaseConfig) -> anyhow::Result<Arc<dyn MarketRepository>> {
    let conn = db::connect_with_config(cfg).await?;
    match cfg.backend {
        StorageBackend::Relational => {
            migration::Migrator::up(&conn, None).await?;
            Ok(Arc::new(SeaOrmRepository::new(conn)))
        }
        StorageBackend::Collections => {
            let repo = CollectionsRepository::open(conn, Some(PathBuf::from(&cfg.data_dir))).await?;
            seed::seed_demo(&repo).await?;
            Ok(Arc::new(repo))
        }
    }
}

/// Collections backend on a private in-memory SQLite database, seeded with demo data.
pub async fn open_degraded() -> anyhow::Result<Arc<dyn MarketRepository>> {
    let conn = db::connect_memory().await?;
    let repo = CollectionsRepository::open(conn, None).await?;
    seed::seed_demo(&repo).await?;
    Ok(Arc::new(repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::DEMO_EMAIL;

    #[tokio::test]
    async fn relational_sqlite_memory_opens_and_migrates() {
        let cfg = DatabaseConfig { url: "sqlite::memory:".into(), ..Default::default() };
        let backend = open_backend(&cfg).await.unwrap();
        assert!(!backend.degraded);
        assert_eq!(backend.kind, StorageBackend::Relational);
        assert!(backend.repo.find_user_by_email(DEMO_EMAIL).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_database_degrades() {
        let cfg = DatabaseConfig {
            url: "postgres://nobody@127.0.0.1:1/market".into(),
            connect_timeout_secs: 1,
            acquire_timeout_secs: 1,
            ..Default::default()
        };
        let backend = open_backend(&cfg).await.unwrap();
        assert!(backend.degraded);
        assert_eq!(backend.kind, StorageBackend::Collections);
        assert!(backend.repo.find_user_by_email(DEMO_EMAIL).await.unwrap().is_some());
    }
}
