use axum::{Router, routing::get};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::analytics::Analytics;
use crate::messenger::MessageSender;
use crate::search::SearchIndex;

pub mod handlers;
pub mod models;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub verify_token: Arc<str>,
    pub sender: Arc<dyn MessageSender>,
    pub index: Arc<dyn SearchIndex>,
    pub analytics: Analytics,
}

impl AppState {
    pub fn new(
        verify_token: impl Into<Arc<str>>,
        sender: Arc<dyn MessageSender>,
        index: Arc<dyn SearchIndex>,
        analytics: Analytics,
    ) -> Self {
        Self {
            verify_token: verify_token.into(),
            sender,
            index,
            analytics,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route(
            "/webhook",
            get(handlers::verify_handler).post(handlers::webhook_handler),
        )
        .route("/:registry/search.json", get(handlers::search_handler))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}
