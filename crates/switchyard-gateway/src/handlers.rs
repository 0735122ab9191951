use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use switchyard_core::SwitchyardError;
use switchyard_fabric::{AgentDescriptor, RoutingEnvelope, RoutingResult};
use switchyard_vector::{
    DotRequest, DotResponse, EmbedRequest, EmbedResponse, QueryRequest, QueryResponse,
    UpsertRequest, UpsertResponse,
};
use tracing::info;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Unwrap a JSON body, turning extractor rejections into `invalid_request`.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError(SwitchyardError::InvalidRequest(rejection.body_text())))
}

pub async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    state.vectors.healthz().await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn embed(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> ApiResult<EmbedResponse> {
    Ok(Json(state.vectors.embed(body(payload)?).await?))
}

pub async fn upsert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpsertRequest>, JsonRejection>,
) -> ApiResult<UpsertResponse> {
    let request = body(payload)?;
    let namespace = request.namespace.clone();
    let response = state.vectors.upsert_vectors(request).await?;
    info!(namespace = ?namespace, upserted = response.upserted, "Upserted vectors");
    Ok(Json(response))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<QueryResponse> {
    Ok(Json(state.vectors.query(body(payload)?).await?))
}

pub async fn dot(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DotRequest>, JsonRejection>,
) -> ApiResult<DotResponse> {
    Ok(Json(state.vectors.dot(body(payload)?).await?))
}

pub async fn route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RoutingEnvelope>, JsonRejection>,
) -> ApiResult<RoutingResult> {
    Ok(Json(state.fabric.route(body(payload)?).await?))
}

pub async fn agents(State(state): State<Arc<AppState>>) -> Json<Vec<AgentDescriptor>> {
    Json(state.fabric.directory().all().to_vec())
}
