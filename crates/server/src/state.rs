use std::sync::Arc;

use configs::{AppConfig, StorageBackend};
use service::ai::{AgentClient, LlmClient};
use service::auth::AuthService;
use service::bootstrap::Backend;
use service::catalog::CatalogService;
use service::orders::OrderService;
use service::repo::MarketRepository;
use service::wallet::WalletService;

pub type Repo = dyn MarketRepository;

/// Shared handler state; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<Repo>>,
    pub catalog: Arc<CatalogService<Repo>>,
    pub orders: Arc<OrderService<Repo>>,
    pub wallet: Arc<WalletService<Repo>>,
    pub llm: LlmClient,
    pub agent: AgentClient,
    pub backend: StorageBackend,
    pub degraded: bool,
}

impl AppState {
    pub fn new(cfg: &AppConfig, backend: Backend) -> Self {
        let repo = backend.repo;
        Self {
            auth: Arc::new(AuthService::new(repo.clone(), cfg.auth.clone())),
            catalog: Arc::new(CatalogService::new(repo.clone())),
            orders: Arc::new(OrderService::new(repo.clone(), cfg.orders.clone())),
            wallet: Arc::new(WalletService::new(repo, cfg.wallet.clone())),
            llm: LlmClient::new(cfg.ai.clone()),
            agent: AgentClient::new(cfg.zeroclaw.clone()),
            backend: backend.kind,
            degraded: backend.degraded,
        }
    }
}
