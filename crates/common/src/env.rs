//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::{info, warn};

/// Ensure the data directory exists; warn when the legacy import directory is missing.
pub async fn ensure_env(data_dir: &str, legacy_dir: Option<&str>) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    info!(%data_dir, "data directory ready");

    if let Some(dir) = legacy_dir {
        if tokio::fs::metadata(dir).await.is_err() {
            warn!(legacy_dir = %dir, "legacy json directory not found; collection import disabled");
        }
    }
    Ok(())
}
