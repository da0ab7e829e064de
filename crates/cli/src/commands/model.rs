//! Describe the model the server is running

use anyhow::Result;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{format_score, print_json, print_table, OutputFormat};

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Best Params")]
    params: String,
    #[tabled(rename = "CV Score")]
    cv_score: String,
    #[tabled(rename = "Format")]
    format_version: u32,
}

pub async fn show_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.model_info().await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Table => {
            let row = ModelRow {
                version: info.version.clone(),
                created_at: info.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                features: info.features.join(", "),
                params: info.best_params.to_string(),
                cv_score: format_score(info.cv_score),
                format_version: info.format_version,
            };
            print_table(&[row]);
        }
    }

    Ok(())
}
