pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod recommend;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth::JwtManager, config::Config, rate_limit::ApiLimiter};

pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
    pub jwt: JwtManager,
    pub limiter: ApiLimiter,
}

impl AppState {
    pub fn new(config: Config, db: DatabaseConnection) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.access_ttl_minutes);
        let limiter = rate_limit::new_limiter(config.rate_limit_per_minute);
        Self { config, db, jwt, limiter }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", axum::routing::get(routes::health))
        .nest(
            "/api/v1",
            routes::api_router()
                .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit::limit)),
        )
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}

pub(crate) fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
