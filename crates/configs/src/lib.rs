use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub zeroclaw: ZeroClawConfig,
    #[serde(default)]
    pub orders: OrdersConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 3002, worker_threads: Some(4) }
    }
}

/// Which persistence backend serves the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SeaORM entities over Postgres or SQLite.
    #[default]
    Relational,
    /// JSON documents per collection in a single SQLite table.
    Collections,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Relational => "relational",
            StorageBackend::Collections => "collections",
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relational" | "sql" => Ok(StorageBackend::Relational),
            "collections" | "json" => Ok(StorageBackend::Collections),
            other => Err(anyhow!("unknown database.backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub url: String,
    /// 数据目录：SQLite 文件与旧版 `<collection>.json` 均位于此处
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: String::new(),
            data_dir: default_data_dir(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_acquire_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: DEFAULT_JWT_SECRET.into(), token_ttl_hours: default_token_ttl() }
    }
}

fn default_token_ttl() -> i64 { 24 * 7 }

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
    /// 上游失败时返回的固定文案；为空则返回 500
    #[serde(default)]
    pub fallback_text: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: default_ai_url(),
            api_key: None,
            model: default_ai_model(),
            timeout_secs: default_ai_timeout(),
            fallback_text: None,
        }
    }
}

fn default_ai_url() -> String { "https://api.deepseek.com/chat/completions".into() }
fn default_ai_model() -> String { "deepseek-chat".into() }
fn default_ai_timeout() -> u64 { 120 }

#[derive(Debug, Clone, Deserialize)]
pub struct ZeroClawConfig {
    #[serde(default = "default_zeroclaw_url")]
    pub url: String,
    #[serde(default = "default_zeroclaw_key")]
    pub api_key: String,
    #[serde(default = "default_zeroclaw_model")]
    pub default_model: String,
    #[serde(default = "default_zc_stream_timeout")]
    pub stream_connect_timeout_secs: u64,
    #[serde(default = "default_zc_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub fallback_to_llm: bool,
}

impl Default for ZeroClawConfig {
    fn default() -> Self {
        Self {
            url: default_zeroclaw_url(),
            api_key: default_zeroclaw_key(),
            default_model: default_zeroclaw_model(),
            stream_connect_timeout_secs: default_zc_stream_timeout(),
            request_timeout_secs: default_zc_request_timeout(),
            fallback_to_llm: false,
        }
    }
}

fn default_zeroclaw_url() -> String { "http://localhost:8080/v1/chat/completions".into() }
fn default_zeroclaw_key() -> String { "zc-local-dev-key".into() }
fn default_zeroclaw_model() -> String { "zeroclaw-default".into() }
fn default_zc_stream_timeout() -> u64 { 5 }
fn default_zc_request_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    /// 进入 processing 后自动发货的延迟（秒），0 表示关闭
    #[serde(default = "default_auto_ship")]
    pub auto_ship_after_secs: u64,
}

impl Default for OrdersConfig {
    fn default() -> Self { Self { auto_ship_after_secs: default_auto_ship() } }
}

fn default_auto_ship() -> u64 { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_max_top_up")]
    pub max_top_up_cents: i64,
}

impl Default for WalletConfig {
    fn default() -> Self { Self { max_top_up_cents: default_max_top_up() } }
}

fn default_max_top_up() -> i64 { 10_000_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self { Self { format: default_log_format() } }
}

fn default_log_format() -> String { "compact".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or defaults when it is absent), apply env overrides, validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                if let Some(io) = e.downcast_ref::<std::io::Error>() {
                    if io.kind() == std::io::ErrorKind::NotFound {
                        AppConfig::default()
                    } else {
                        return Err(e);
                    }
                } else {
                    return Err(e);
                }
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// 环境变量覆盖 TOML 配置；`lookup` 便于测试注入
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(h) = lookup("SERVER_HOST") { self.server.host = h; }
        if let Some(p) = lookup("PORT").or_else(|| lookup("SERVER_PORT")).and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = p;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(url) = lookup("DATABASE_URL") { self.database.url = url; }
        if let Some(b) = lookup("DB_BACKEND").and_then(|b| b.parse::<StorageBackend>().ok()) {
            self.database.backend = b;
        }
        if let Some(dir) = lookup("DATA_DIR").or_else(|| lookup("DB_PATH")) { self.database.data_dir = dir; }
        if let Some(s) = lookup("JWT_SECRET") { self.auth.jwt_secret = s; }
        if let Some(k) = lookup("DEEPSEEK_API_KEY") { self.ai.api_key = Some(k); }
        if let Some(u) = lookup("AI_API_URL") { self.ai.api_url = u; }
        if let Some(u) = lookup("ZEROCLAW_URL") { self.zeroclaw.url = u; }
        if let Some(k) = lookup("ZEROCLAW_API_KEY") { self.zeroclaw.api_key = k; }
        if let Some(f) = lookup("LOG_FORMAT") { self.log.format = f; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 归一化 database（未提供 URL 时按后端推导 SQLite 文件）
        self.database.normalize();
        self.database.validate()?;
        self.auth.validate()?;
        self.ai.normalize();
        if self.wallet.max_top_up_cents <= 0 {
            return Err(anyhow!("wallet.max_top_up_cents 必须为正数"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize(&mut self) {
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        if self.url.trim().is_empty() {
            let file = match self.backend {
                StorageBackend::Relational => "market.sqlite",
                StorageBackend::Collections => "data.sqlite",
            };
            self.url = format!("sqlite://{}/{}?mode=rwc", self.data_dir.trim_end_matches('/'), file);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.url.to_lowercase();
        let is_pg = lower.starts_with("postgresql://") || lower.starts_with("postgres://");
        let is_sqlite = lower.starts_with("sqlite:");
        if !(is_pg || is_sqlite) {
            return Err(anyhow!("database.url 必须以 postgres://、postgresql:// 或 sqlite: 开头"));
        }
        if self.backend == StorageBackend::Collections && !is_sqlite {
            return Err(anyhow!("collections 后端仅支持 sqlite: 连接串"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections 必须 >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections 必须 >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database 超时配置必须为正整数秒"));
        }
        Ok(())
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.to_lowercase().starts_with("sqlite:")
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret 不能为空"));
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("auth.jwt_secret uses the development default; set JWT_SECRET in production");
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours 必须为正数"));
        }
        Ok(())
    }
}

impl AiConfig {
    fn normalize(&mut self) {
        // 空字符串视为未配置
        if self.api_key.as_deref().map(str::trim).map_or(false, str::is_empty) {
            self.api_key = None;
        }
        if self.fallback_text.as_deref().map(str::trim).map_or(false, str::is_empty) {
            self.fallback_text = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_normalize_to_sqlite_file() {
        let mut cfg = AppConfig::default();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.database.backend, StorageBackend::Relational);
        assert_eq!(cfg.database.url, "sqlite://data/market.sqlite?mode=rwc");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.orders.auto_ship_after_secs, 5);
    }

    #[test]
    fn toml_sections_are_parsed() {
        let cfg = parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8081

            [database]
            backend = "collections"
            data_dir = "/tmp/market"

            [ai]
            api_key = "sk-test"
            fallback_text = "AI 正在思考您的需求... 请稍候。"

            [zeroclaw]
            fallback_to_llm = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.database.backend, StorageBackend::Collections);
        assert_eq!(cfg.ai.api_key.as_deref(), Some("sk-test"));
        assert!(cfg.zeroclaw.fallback_to_llm);
        assert_eq!(cfg.zeroclaw.stream_connect_timeout_secs, 5);
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://u:p@localhost/market"),
            ("JWT_SECRET", "s3cret"),
            ("DEEPSEEK_API_KEY", "sk-env"),
            ("DB_BACKEND", "relational"),
        ]);
        let mut cfg = AppConfig::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.url, "postgres://u:p@localhost/market");
        assert_eq!(cfg.auth.jwt_secret, "s3cret");
        assert_eq!(cfg.ai.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn collections_backend_rejects_postgres() {
        let mut cfg = AppConfig::default();
        cfg.database.backend = StorageBackend::Collections;
        cfg.database.url = "postgres://localhost/market".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.database.url = "mysql://localhost/market".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = AppConfig::default();
        cfg.ai.api_key = Some("  ".into());
        cfg.normalize_and_validate().unwrap();
        assert!(cfg.ai.api_key.is_none());
    }
}
