//! Observability for training runs and the prediction service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, request/inference errors, loaded model)
//! - Structured lifecycle events with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    Encoder, GaugeVec, Histogram, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for single-record inference (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1,
];

static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    request_errors_total: IntCounterVec,
    inference_errors_total: IntCounter,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "house_price_prediction_latency_seconds",
                "Time spent running the model for one prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "house_price_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            request_errors_total: register_int_counter_vec!(
                "house_price_request_errors_total",
                "Prediction requests rejected before reaching the model",
                &["reason"]
            )
            .expect("Failed to register request_errors_total"),

            inference_errors_total: register_int_counter!(
                "house_price_inference_errors_total",
                "Failures while predicting on well-formed input"
            )
            .expect("Failed to register inference_errors_total"),

            model_info: register_gauge_vec!(
                "house_price_model_info",
                "The model artifact currently being served",
                &["version", "features"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide metrics; clones share the same registry entries
#[derive(Clone)]
pub struct ServiceMetrics {
    inner: &'static ServiceMetricsInner,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            inner: GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new),
        }
    }

    pub fn observe_prediction(&self, duration_secs: f64) {
        self.inner.prediction_latency_seconds.observe(duration_secs);
        self.inner.predictions_total.inc();
    }

    pub fn inc_request_errors(&self, reason: &str) {
        self.inner.request_errors_total.with_label_values(&[reason]).inc();
    }

    pub fn inc_inference_errors(&self) {
        self.inner.inference_errors_total.inc();
    }

    pub fn predictions_total(&self) -> u64 {
        self.inner.predictions_total.get()
    }

    /// Replace the loaded-model label set
    pub fn set_model_info(&self, version: &str, features: &[String]) {
        let features = features.join(",");
        self.inner.model_info.reset();
        self.inner
            .model_info
            .with_label_values(&[version, features.as_str()])
            .set(1.0);
    }
}

/// Render the default registry in the Prometheus text format
pub fn gather_text() -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(buffer)
}

/// Emits named lifecycle events with consistent fields
#[derive(Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn service_started(&self, version: &str, addr: &str, model_version: &str) {
        info!(
            event = "service_started",
            component = %self.component,
            service_version = %version,
            addr = %addr,
            model_version = %model_version,
            "Prediction service started"
        );
    }

    pub fn service_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            component = %self.component,
            reason = %reason,
            "Prediction service shutting down"
        );
    }

    pub fn model_loaded(&self, path: &str, version: &str, features: &[String], cv_score: f64) {
        info!(
            event = "model_loaded",
            component = %self.component,
            path = %path,
            model_version = %version,
            features = ?features,
            cv_score = cv_score,
            "Model artifact loaded"
        );
    }

    pub fn prediction_served(&self, prediction: f64, latency_secs: f64, model_version: &str) {
        info!(
            event = "prediction_served",
            component = %self.component,
            prediction = prediction,
            latency_us = (latency_secs * 1e6) as u64,
            model_version = %model_version,
            "Served prediction"
        );
    }

    pub fn prediction_rejected(&self, reason: &str, detail: &str) {
        warn!(
            event = "prediction_rejected",
            component = %self.component,
            reason = %reason,
            detail = %detail,
            "Rejected prediction request"
        );
    }

    pub fn training_completed(
        &self,
        features: &[String],
        best_params: &str,
        cv_score: f64,
        test_r2: f64,
        duration_secs: f64,
    ) {
        info!(
            event = "training_completed",
            component = %self.component,
            features = ?features,
            best_params = %best_params,
            cv_score = cv_score,
            test_r2 = test_r2,
            duration_secs = duration_secs,
            "Training run completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_are_shared_and_exported() {
        let a = ServiceMetrics::new();
        let b = a.clone();
        let before = a.predictions_total();
        b.observe_prediction(0.0002);
        assert!(a.predictions_total() >= before + 1);

        a.inc_request_errors("missing_field");
        a.inc_inference_errors();
        a.set_model_info("abc123", &["RM".to_string(), "LSTAT".to_string()]);

        let text = String::from_utf8(gather_text().unwrap()).unwrap();
        assert!(text.contains("house_price_predictions_total"));
        assert!(text.contains("house_price_model_info"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("server");
        assert_eq!(logger.component, "server");
    }
}
