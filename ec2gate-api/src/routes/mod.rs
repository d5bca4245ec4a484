// Routes module - Centralizes all route definitions
use crate::api_docs;
use crate::app::AppState;
use crate::handlers::instances;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the main application router
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api_docs::ApiDoc::openapi()),
        )
        .route("/", get(root))
        .route("/instances", get(instances::list_instances))
        .route("/instances/{id}", get(instances::get_instance))
        .route("/instances/{id}/start", get(instances::start_instance))
        .route("/instances/{id}/stop", get(instances::stop_instance))
        .route("/instances/{id}/reboot", get(instances::reboot_instance))
}

async fn root() -> &'static str {
    "EC2 Gate - managed instance control surface"
}
