pub mod health;
pub mod ingest;
pub mod royalties;

use crate::db::Repository;
use crate::orchestration::Orchestrator;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { repo, orchestrator }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/fills", post(ingest::post_fills))
        .route(
            "/v1/collections/:contract/royalties",
            put(ingest::put_collection_royalties),
        )
        .route("/v1/royalties/attribute", post(royalties::attribute_sale))
        .route("/v1/royalties", get(royalties::get_report))
        .layer(cors)
        .with_state(state)
}
