//! HTTP API: prediction, model info, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{gather_text, ServiceMetrics, StructuredLogger},
    ErrorResponse, FeatureRecord, PredictionResponse, Predictor,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state; the predictor is immutable once built
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(predictor: Arc<dyn Predictor>, health_registry: HealthRegistry) -> Self {
        Self {
            predictor,
            health_registry,
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new("price-server"),
        }
    }
}

fn error_response(status: StatusCode, code: &str, message: impl ToString) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

/// Validate the body against the serving schema, then run the model
async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.metrics.inc_request_errors("undecodable_body");
            state.logger.prediction_rejected("undecodable_body", &rejection.body_text());
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse::INVALID_REQUEST,
                rejection.body_text(),
            );
        }
    };

    let record = match FeatureRecord::from_json(&body, state.predictor.schema()) {
        Ok(record) => record,
        Err(e) => {
            state.metrics.inc_request_errors(e.kind());
            state.logger.prediction_rejected(e.kind(), &e.to_string());
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::INVALID_REQUEST,
                e,
            );
        }
    };

    let start = Instant::now();
    match state.predictor.predict(&record) {
        Ok(result) => {
            let api_status = state.health_registry.status(components::API).await;
            if api_status == Some(ComponentStatus::Degraded) {
                state.health_registry.set_healthy(components::API).await;
            }
            let info = state.predictor.model_info();
            state.logger.prediction_served(
                result.prediction,
                start.elapsed().as_secs_f64(),
                &info.version,
            );
            (
                StatusCode::OK,
                Json(PredictionResponse {
                    prediction: result.prediction,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Prediction failed");
            state
                .health_registry
                .set_degraded(components::API, format!("Last prediction failed: {}", e))
                .await;
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::INFERENCE_FAILED,
                e,
            )
        }
    }
}

async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.predictor.model_info())
}

/// 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// 200 once the model is loaded, 503 before
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    match gather_text() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/model", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve until `shutdown` resolves, letting in-flight requests finish
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
