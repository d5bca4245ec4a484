//! Instance endpoints. Every core error maps to HTTP 500 with a
//! `{"result":"ko"}` envelope; the error kinds stay in the message
//! text, not the status code.

use crate::app::AppState;
use crate::dispatcher::{self, Operation, Outcome};
use crate::credentials;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ec2gate_common::{GateError, ManagedInstance};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LifecycleParams {
    /// EC2 region override; defaults to the configured region.
    pub region: Option<String>,
    /// Named account section to take credentials from.
    pub account: Option<String>,
    /// Explicit access key; overrides configuration.
    pub key: Option<String>,
    /// Explicit secret; overrides configuration.
    pub secret: Option<String>,
    /// Host label to synchronize under the configured DNS domain.
    /// Only honored by start and stop.
    pub hostname: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListingResponse {
    pub result: String,
    pub machine: Vec<ManagedInstance>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub result: String,
    pub message: String,
}

fn error_response(err: GateError) -> Response {
    error!(%err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse {
            result: "ko".to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

async fn run(
    state: &AppState,
    operation: Operation,
    instance_id: Option<&str>,
    params: &LifecycleParams,
) -> Response {
    let context = match credentials::resolve(
        &state.settings,
        params.region.as_deref(),
        params.account.as_deref(),
        params.key.as_deref(),
        params.secret.as_deref(),
    ) {
        Ok(context) => context,
        Err(err) => return error_response(err),
    };

    let outcome = dispatcher::execute(
        &state.factory,
        &state.settings,
        &context,
        operation,
        instance_id,
        params.hostname.as_deref(),
    )
    .await;

    match outcome {
        Ok(Outcome::Listing { machines, total }) => Json(ListingResponse {
            result: "ok".to_string(),
            machine: machines,
            total,
        })
        .into_response(),
        Ok(Outcome::Command { message }) => Json(MessageResponse {
            result: "ok".to_string(),
            message,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

/// List all managed instances
#[utoipa::path(
    get,
    path = "/instances",
    params(LifecycleParams),
    responses(
        (status = 200, description = "Managed instances with volumes", body = ListingResponse),
        (status = 500, description = "Resolution or provider failure", body = MessageResponse)
    )
)]
pub async fn list_instances(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LifecycleParams>,
) -> Response {
    run(&state, Operation::List, None, &params).await
}

/// List one managed instance by id
#[utoipa::path(
    get,
    path = "/instances/{id}",
    params(("id" = String, Path, description = "Instance id"), LifecycleParams),
    responses(
        (status = 200, description = "The instance, if managed", body = ListingResponse),
        (status = 500, description = "Unknown or unmanaged instance", body = MessageResponse)
    )
)]
pub async fn get_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LifecycleParams>,
) -> Response {
    run(&state, Operation::List, Some(&id), &params).await
}

/// Start a managed instance
#[utoipa::path(
    get,
    path = "/instances/{id}/start",
    params(("id" = String, Path, description = "Instance id"), LifecycleParams),
    responses(
        (status = 200, description = "Start issued", body = MessageResponse),
        (status = 500, description = "Command or DNS failure", body = MessageResponse)
    )
)]
pub async fn start_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LifecycleParams>,
) -> Response {
    run(&state, Operation::Start, Some(&id), &params).await
}

/// Stop a managed instance
#[utoipa::path(
    get,
    path = "/instances/{id}/stop",
    params(("id" = String, Path, description = "Instance id"), LifecycleParams),
    responses(
        (status = 200, description = "Stop issued", body = MessageResponse),
        (status = 500, description = "Command or DNS failure", body = MessageResponse)
    )
)]
pub async fn stop_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LifecycleParams>,
) -> Response {
    run(&state, Operation::Stop, Some(&id), &params).await
}

/// Reboot a managed instance
#[utoipa::path(
    get,
    path = "/instances/{id}/reboot",
    params(("id" = String, Path, description = "Instance id"), LifecycleParams),
    responses(
        (status = 200, description = "Reboot issued", body = MessageResponse),
        (status = 500, description = "Command failure", body = MessageResponse)
    )
)]
pub async fn reboot_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LifecycleParams>,
) -> Response {
    run(&state, Operation::Reboot, Some(&id), &params).await
}
