use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use mercury_core::MercuryError;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

use crate::AppState;

struct ApiError(MercuryError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<MercuryError> for ApiError {
    fn from(e: MercuryError) -> Self {
        Self(e)
    }
}

#[derive(Deserialize)]
pub struct BindRequest {
    #[serde(default)]
    pub package_uuid: String,
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub caller: String,
}

#[derive(Serialize)]
pub struct BindResponse {
    pub request_id: String,
    pub key_b64: String,
    pub hmac: String,
}

pub async fn bind(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BindRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<BindResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError(MercuryError::MalformedBody(e.to_string())))?;

    if req.package_uuid.is_empty() {
        return Err(ApiError(MercuryError::MissingField("package_uuid")));
    }
    if req.pipeline_name.is_empty() {
        return Err(ApiError(MercuryError::MissingField("pipeline_name")));
    }

    state.metrics.in_flight_requests.inc();
    let outcome = state
        .pipeline
        .bind(&req.package_uuid, &req.pipeline_name, &req.caller)
        .await;
    state.metrics.in_flight_requests.dec();

    let outcome = outcome.map_err(|e| {
        state.metrics.binds_total.with_label_values(&[outcome_label(&e)]).inc();
        e
    })?;
    state.metrics.binds_total.with_label_values(&["ok"]).inc();
    state
        .metrics
        .quota_remaining
        .with_label_values(&[&outcome.group])
        .set(outcome.quota_remaining as f64);

    Ok(Json(BindResponse {
        request_id: outcome.request_id,
        key_b64: outcome.key_b64,
        hmac: outcome.hmac,
    }))
}

fn outcome_label(e: &MercuryError) -> &'static str {
    match e {
        MercuryError::NotAuthorized { .. } => "forbidden",
        MercuryError::QuotaExceeded { .. } => "quota_exceeded",
        _ => "error",
    }
}

#[derive(Deserialize)]
pub struct RetrieveRequest {
    #[serde(default)]
    pub package_uuid: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Serialize)]
pub struct RetrieveResponse {
    pub key_b64: String,
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RetrieveRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError(MercuryError::MalformedBody(e.to_string())))?;

    if req.package_uuid.is_empty() {
        return Err(ApiError(MercuryError::MissingField("package_uuid")));
    }

    let outcome = state
        .pipeline
        .retrieve(&req.package_uuid, req.request_id.as_deref())
        .await;

    let outcome = outcome.map_err(|e| {
        state
            .metrics
            .retrieves_total
            .with_label_values(&[if matches!(e, MercuryError::KeyNotFound) { "not_found" } else { "error" }])
            .inc();
        e
    })?;
    state.metrics.retrieves_total.with_label_values(&["ok"]).inc();

    Ok(Json(RetrieveResponse { key_b64: outcome.key_b64 }))
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<mercury_tracker::RequestRecord>, ApiError> {
    let record = state.pipeline.get_request(&id).await?;
    Ok(Json(record))
}

pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<Arc<AppState>>) -> Response {
    let mercury_ok = ping(&state.mercury_redis).await;
    let pipeline_ok = ping(&state.pipeline_redis).await;

    let body = serde_json::json!({
        "mercury_redis": if mercury_ok { "ok" } else { "error" },
        "pipeline_redis": if pipeline_ok { "ok" } else { "error" },
    });

    let status = if mercury_ok && pipeline_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body)).into_response()
}

async fn ping(conn: &ConnectionManager) -> bool {
    let mut conn = conn.clone();
    redis::cmd("PING").query_async::<_, String>(&mut conn).await.is_ok()
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.render()
}
