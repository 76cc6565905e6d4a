//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime::ensure_env` without depending directly on `common`.

/// Ensure the data directory exists; warn when the legacy JSON directory is missing.
pub async fn ensure_env(data_dir: &str, legacy_dir: Option<&str>) -> anyhow::Result<()> {
    common::env::ensure_env(data_dir, legacy_dir).await
}
