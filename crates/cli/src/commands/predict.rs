//! Ask the server for a price and record it locally

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::client::{ApiClient, PredictRequest};
use crate::history::{HistoryEntry, PredictionHistory};
use crate::output::{format_price, print_json, print_success, print_warning, OutputFormat};

#[derive(Serialize)]
struct PredictOutput<'a> {
    #[serde(flatten)]
    inputs: &'a PredictRequest,
    prediction: f64,
}

pub async fn predict(
    client: &ApiClient,
    request: PredictRequest,
    history: &PredictionHistory,
    format: OutputFormat,
) -> Result<()> {
    let response = client.predict(&request).await?;

    let entry = HistoryEntry {
        timestamp: Utc::now(),
        inputs: request,
        prediction: response.prediction,
    };
    // The prediction already succeeded; a history failure only warns
    if let Err(e) = history.append(&entry) {
        print_warning(&format!("Could not record prediction: {:#}", e));
    } else {
        debug!(path = %history.path().display(), "Recorded prediction");
    }

    match format {
        OutputFormat::Json => print_json(&PredictOutput {
            inputs: &request,
            prediction: response.prediction,
        })?,
        OutputFormat::Table => {
            print_success(&format!(
                "Predicted median value: {} ({:.2})",
                format_price(response.prediction),
                response.prediction
            ));
        }
    }

    Ok(())
}
