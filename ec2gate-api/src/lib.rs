pub mod api_docs;
pub mod app;
pub mod catalog;
pub mod credentials;
pub mod dispatcher;
pub mod dns_sync;
pub mod handlers;
pub mod routes;
pub mod session;

use app::AppState;
use axum::Router;
use std::sync::Arc;

/// Assembles the full application router with CORS applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router()
        .layer(app::create_cors())
        .with_state(state)
}
