//! House Price Predictor CLI
//!
//! Trains the pricing model offline, queries a running price server,
//! and keeps a local history of predictions.

mod client;
mod commands;
mod config;
mod history;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use client::{ApiClient, PredictRequest};
use history::PredictionHistory;

/// House Price Predictor CLI
#[derive(Parser)]
#[command(name = "hpp")]
#[command(author, version, about = "CLI for the House Price Predictor", long_about = None)]
pub struct Cli {
    /// Price server URL (can also be set via HPP_API_URL env var)
    #[arg(long, env = "HPP_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model and write the artifact the server loads
    Train {
        /// TOML training config; HPP_* env vars override it
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Predict the median value of a house
    Predict {
        /// % lower status of the population
        #[arg(long)]
        lstat: f64,
        /// Average number of rooms per dwelling
        #[arg(long)]
        rm: f64,
        /// Per-capita crime rate by town
        #[arg(long)]
        crim: f64,
        /// Pupil-teacher ratio by town
        #[arg(long)]
        ptratio: f64,
        /// Proportion of non-retail business acres per town
        #[arg(long)]
        indus: f64,
        /// Full-value property-tax rate per $10,000
        #[arg(long)]
        tax: f64,
        /// Nitric oxides concentration (parts per 10 million)
        #[arg(long)]
        nox: f64,
        /// 1000(Bk - 0.63)^2 where Bk is the proportion of Black residents by town
        #[arg(long)]
        b: f64,

        /// Where to record the prediction
        #[arg(long, env = "HPP_HISTORY_FILE")]
        history_file: Option<PathBuf>,
    },

    /// Show recent predictions made from this machine
    History {
        /// Number of entries to show
        #[arg(long, short, default_value_t = 5)]
        limit: usize,

        #[arg(long, env = "HPP_HISTORY_FILE")]
        history_file: Option<PathBuf>,
    },

    /// Show the model the server is running
    Model,
}

fn open_history(path: Option<PathBuf>) -> Result<PredictionHistory> {
    let path = match path {
        Some(path) => path,
        None => PredictionHistory::default_path()?,
    };
    Ok(PredictionHistory::new(path))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Train { config } => {
            let config = config::load_training_config(config.as_deref())?;
            commands::train::train(config, cli.format).await?;
        }
        Commands::Predict {
            lstat,
            rm,
            crim,
            ptratio,
            indus,
            tax,
            nox,
            b,
            history_file,
        } => {
            let client = ApiClient::new(&cli.api_url)?;
            let history = open_history(history_file)?;
            let request = PredictRequest {
                lstat,
                rm,
                crim,
                ptratio,
                indus,
                tax,
                nox,
                b,
            };
            commands::predict::predict(&client, request, &history, cli.format).await?;
        }
        Commands::History {
            limit,
            history_file,
        } => {
            let history = open_history(history_file)?;
            commands::history::show_history(&history, limit, cli.format)?;
        }
        Commands::Model => {
            let client = ApiClient::new(&cli.api_url)?;
            commands::model::show_model(&client, cli.format).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info,predictor_lib=debug,hpp=debug".into()),
            )
            .init();
    }

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
