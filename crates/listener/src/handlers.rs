use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use coordinator::{Deployer, TriggerOutcome};
use deploy::{DeploymentRunId, StatusSnapshot, SIGNATURE_HEADER};
use serde::Serialize;
use serde_json::json;

use crate::page::render_status_page;
use crate::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookResponse {
    status: &'static str,
    run_id: DeploymentRunId,
}

pub(crate) async fn webhook(
    State(deployer): State<Deployer>,
    Path(repository_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = deployer
        .handle_delivery(&repository_id, signature, &body)
        .await?;

    let response = match outcome {
        TriggerOutcome::Ignored => {
            (StatusCode::OK, Json(json!({ "status": "ignored" }))).into_response()
        }
        TriggerOutcome::Accepted { run_id } => accepted(StatusCode::ACCEPTED, "accepted", run_id),
        TriggerOutcome::Completed {
            run_id,
            success: true,
        } => accepted(StatusCode::OK, "deployed", run_id),
        TriggerOutcome::Completed {
            run_id,
            success: false,
        } => accepted(StatusCode::INTERNAL_SERVER_ERROR, "failed", run_id),
    };
    Ok(response)
}

fn accepted(code: StatusCode, status: &'static str, run_id: DeploymentRunId) -> Response {
    (code, Json(WebhookResponse { status, run_id })).into_response()
}

pub(crate) async fn status_feed(State(deployer): State<Deployer>) -> Json<StatusSnapshot> {
    Json(deployer.status())
}

pub(crate) async fn status_page(State(deployer): State<Deployer>) -> Html<String> {
    Html(render_status_page(deployer.registry(), &deployer.status()))
}

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

pub(crate) async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// No route matched the path at all.
pub(crate) async fn unmatched_path(method: Method) -> StatusCode {
    if method == Method::GET || method == Method::HEAD || method == Method::POST {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::METHOD_NOT_ALLOWED
    }
}

/// The path matched a route that does not accept this method.
///
/// A POST to an informational path (`POST /status.json`) addresses a
/// repository that does not exist, so it is a 404 like any other unknown id.
pub(crate) async fn unmatched_method(method: Method) -> Response {
    if method == Method::POST {
        ApiError(deploy::DeployError::UnknownRepository {
            id: String::new(),
        })
        .into_response()
    } else if method == Method::GET || method == Method::HEAD {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}
