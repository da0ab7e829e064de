//! Training configuration loading for the CLI

use anyhow::{Context, Result};
use predictor_lib::TrainingConfig;
use std::path::Path;

/// Defaults, then the optional TOML file, then `HPP_*` environment variables
pub fn load_training_config(file: Option<&Path>) -> Result<TrainingConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = file {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("HPP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read training configuration")?;

    settings
        .try_deserialize()
        .context("Invalid training configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
dataset_path = "data/housing.csv"
n_features = 5
selection_scheme = "difference"

[search_space]
max_depth = [3, 4]
learning_rate = [0.05]
"#
        )
        .unwrap();

        let cfg = load_training_config(Some(file.path())).unwrap();
        assert_eq!(cfg.dataset_path, PathBuf::from("data/housing.csv"));
        assert_eq!(cfg.n_features, 5);
        assert_eq!(cfg.search_space.max_depth, vec![3, 4]);
        assert_eq!(cfg.search_space.learning_rate, vec![0.05]);
        assert_eq!(cfg.search_space.n_estimators, vec![100]);
        // Untouched keys keep their defaults
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.cv_folds, 5);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_training_config(Some(Path::new("/nonexistent/train.toml"))).is_err());
    }
}
