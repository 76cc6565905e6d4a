pub mod ai;
pub mod auth;
pub mod maker;
pub mod market;
pub mod orders;
pub mod user;
pub mod zeroclaw;

use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use common::types::Health;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::require_bearer;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health { status: "ok", backend: state.backend.as_str().to_string(), degraded: state.degraded })
}

/// Build the full application router: public, bearer-protected and AI routes
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/market/services", get(market::list))
        .route("/api/market/featured", get(market::featured))
        .route("/api/market/services/:id", get(market::detail))
        .route("/api/ai/chat", post(ai::chat))
        .route("/api/zeroclaw/agent", post(zeroclaw::agent));

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        // services 是 maker 路由的旧别名；GET 列表公开，单独挂在下面
        .route("/api/services", post(maker::create))
        .route("/api/services/my", get(maker::my_listings))
        .route("/api/maker/services", get(maker::my_listings).post(maker::create))
        .route("/api/maker/services/:id", put(maker::update).delete(maker::remove))
        .route("/api/maker/orders", get(maker::sales))
        .route("/api/maker/stats", get(maker::stats))
        .route("/api/orders", post(orders::create))
        .route("/api/orders/my", get(orders::mine))
        .route("/api/orders/maker", get(maker::sales))
        .route("/api/orders/:id", get(orders::detail))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route("/api/user/profile", get(user::profile).put(user::update_profile))
        .route("/api/user/addresses", get(user::addresses).post(user::add_address))
        .route("/api/user/orders", get(orders::mine))
        .route("/api/user/wallet", get(user::wallet))
        .route("/api/user/wallet/topup", post(user::top_up))
        .route("/api/user/checkin", post(user::check_in))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    // GET /api/services 公开，POST 需要登录
    let services_list = Router::new().route("/api/services", get(market::list));

    public
        .merge(services_list)
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
