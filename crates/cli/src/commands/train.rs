//! Offline training: select features, search, persist the winning pipeline

use anyhow::{Context, Result};
use predictor_lib::{run_training, TrainingConfig, TrainingReport};
use tabled::Tabled;

use crate::output::{color_r2, format_score, print_info, print_json, print_success, print_table, OutputFormat};

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Feature")]
    name: String,
    #[tabled(rename = "Score")]
    score: String,
}

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Max Depth")]
    max_depth: usize,
    #[tabled(rename = "Learning Rate")]
    learning_rate: f64,
    #[tabled(rename = "Estimators")]
    n_estimators: usize,
    #[tabled(rename = "CV Score")]
    score: String,
}

pub async fn train(config: TrainingConfig, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Table) {
        print_info(&format!(
            "Training on {} ({} candidates, {}-fold CV)",
            config.dataset_path.display(),
            config.n_iter,
            config.cv_folds
        ));
    }

    let report = tokio::task::spawn_blocking(move || run_training(&config))
        .await
        .context("Training task panicked")?
        .context("Training failed")?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &TrainingReport) {
    let features: Vec<FeatureRow> = report
        .selected_features
        .names()
        .iter()
        .zip(report.selected_features.scores())
        .enumerate()
        .map(|(i, (name, score))| FeatureRow {
            rank: i + 1,
            name: name.clone(),
            score: format!("{:.4}", score),
        })
        .collect();
    println!("\nSelected features:");
    print_table(&features);

    let mut leaderboard = report.leaderboard.clone();
    leaderboard.sort_by(|a, b| b.mean_score.total_cmp(&a.mean_score));
    let candidates: Vec<CandidateRow> = leaderboard
        .iter()
        .map(|c| CandidateRow {
            max_depth: c.params.max_depth,
            learning_rate: c.params.learning_rate,
            n_estimators: c.params.n_estimators,
            score: format_score(c.mean_score),
        })
        .collect();
    println!("\nSearch candidates (neg MSE, log space):");
    print_table(&candidates);

    let eval = &report.evaluation;
    println!();
    println!("  Best params: {}", report.best_params);
    println!("  CV score:    {}", format_score(report.cv_score));
    println!(
        "  R²:          train {}  test {}",
        color_r2(eval.train_r2),
        color_r2(eval.test_r2)
    );
    println!(
        "  RMSE:        train {:.3}  test {:.3}",
        eval.train_rmse, eval.test_rmse
    );
    println!(
        "  Rows:        train {}  test {}",
        report.train_rows, report.test_rows
    );
    println!();

    print_success(&format!(
        "Saved model to {} (checksum {})",
        report.artifact_path.display(),
        &report.checksum[..report.checksum.len().min(12)]
    ));
}
