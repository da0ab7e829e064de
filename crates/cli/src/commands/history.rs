//! Show recent local predictions

use anyhow::Result;
use tabled::Tabled;

use crate::history::PredictionHistory;
use crate::output::{format_price, print_json, print_table, print_warning, OutputFormat};

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "LSTAT")]
    lstat: f64,
    #[tabled(rename = "RM")]
    rm: f64,
    #[tabled(rename = "CRIM")]
    crim: f64,
    #[tabled(rename = "PTRATIO")]
    ptratio: f64,
    #[tabled(rename = "INDUS")]
    indus: f64,
    #[tabled(rename = "TAX")]
    tax: f64,
    #[tabled(rename = "NOX")]
    nox: f64,
    #[tabled(rename = "B")]
    b: f64,
    #[tabled(rename = "Prediction")]
    prediction: String,
}

pub fn show_history(history: &PredictionHistory, limit: usize, format: OutputFormat) -> Result<()> {
    let entries = history.recent(limit)?;

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            if entries.is_empty() {
                print_warning("No predictions recorded yet");
                return Ok(());
            }

            let rows: Vec<HistoryRow> = entries
                .iter()
                .map(|e| HistoryRow {
                    timestamp: e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    lstat: e.inputs.lstat,
                    rm: e.inputs.rm,
                    crim: e.inputs.crim,
                    ptratio: e.inputs.ptratio,
                    indus: e.inputs.indus,
                    tax: e.inputs.tax,
                    nox: e.inputs.nox,
                    b: e.inputs.b,
                    prediction: format_price(e.prediction),
                })
                .collect();

            print_table(&rows);
            println!("\nShowing {} most recent", rows.len());
        }
    }

    Ok(())
}
