//! Tabular dataset loading and splitting
//!
//! Reads a headered CSV wholesale, separates the target column from the
//! candidate features, and produces seeded train/test splits.

use crate::error::DataError;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Labeled tabular data: named numeric feature columns plus one target
#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    target_name: String,
    features: Array2<f64>,
    target: Array1<f64>,
}

impl Dataset {
    /// Build a dataset from already-parsed parts
    pub fn new(
        feature_names: Vec<String>,
        target_name: impl Into<String>,
        features: Array2<f64>,
        target: Array1<f64>,
    ) -> Result<Self, DataError> {
        if features.ncols() != feature_names.len() {
            return Err(DataError::InvalidSplit(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                features.ncols()
            )));
        }
        if features.nrows() != target.len() {
            return Err(DataError::InvalidSplit(format!(
                "{} feature rows for {} target values",
                features.nrows(),
                target.len()
            )));
        }
        if target.is_empty() {
            return Err(DataError::Empty);
        }
        Ok(Self {
            feature_names,
            target_name: target_name.into(),
            features,
            target,
        })
    }

    /// Load a CSV file with a header row
    pub fn from_csv(path: &Path, target_column: &str) -> Result<Self, DataError> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(BufReader::new(file), path, target_column)?;

        info!(
            path = %path.display(),
            rows = dataset.n_rows(),
            features = dataset.n_features(),
            target = %target_column,
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Parse CSV content from any reader; `origin` is only used in error messages
    pub fn from_reader<R: Read>(
        reader: R,
        origin: &Path,
        target_column: &str,
    ) -> Result<Self, DataError> {
        let malformed = |message: String| DataError::Malformed {
            path: origin.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| malformed(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        for (i, name) in headers.iter().enumerate() {
            if headers[..i].contains(name) {
                return Err(malformed(format!("column '{}' appears more than once", name)));
            }
        }

        let target_idx = headers
            .iter()
            .position(|h| h == target_column)
            .ok_or_else(|| DataError::MissingColumn(target_column.to_string()))?;

        let mut values: Vec<f64> = Vec::new();
        let mut target: Vec<f64> = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(format!("row {}: {}", row, e)))?;
            if record.len() != headers.len() {
                return Err(malformed(format!(
                    "row {} has {} fields, header has {}",
                    row,
                    record.len(),
                    headers.len()
                )));
            }
            for (col, raw) in record.iter().enumerate() {
                let value = parse_cell(raw).ok_or_else(|| DataError::NonNumeric {
                    column: headers[col].clone(),
                    row,
                    value: raw.to_string(),
                })?;
                if col == target_idx {
                    target.push(value);
                } else {
                    values.push(value);
                }
            }
        }

        if target.is_empty() {
            return Err(DataError::Empty);
        }

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let features = Array2::from_shape_vec((target.len(), feature_names.len()), values)
            .map_err(|e| malformed(e.to_string()))?;

        Self::new(feature_names, target_column, features, Array1::from_vec(target))
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }

    /// Natural log of the target, the space the regressor is trained in
    pub fn log_target(&self) -> Result<Array1<f64>, DataError> {
        if let Some((row, &value)) = self.target.iter().enumerate().find(|(_, v)| **v <= 0.0) {
            return Err(DataError::NonPositiveTarget { row, value });
        }
        Ok(self.target.mapv(f64::ln))
    }

    /// Feature matrix restricted to `names`, columns in the given order
    pub fn select_columns(&self, names: &[String]) -> Result<Array2<f64>, DataError> {
        let indices = names
            .iter()
            .map(|name| {
                self.feature_names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| DataError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.features.select(Axis(1), &indices))
    }

    /// Rows at `indices`, in that order
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            target_name: self.target_name.clone(),
            features: self.features.select(Axis(0), indices),
            target: self.target.select(Axis(0), indices),
        }
    }
}

fn parse_cell(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Disjoint train and test partitions of one dataset
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Shuffle rows with a seeded RNG and hold out `ceil(n * test_fraction)` for testing
pub fn train_test_split(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidSplit(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n = dataset.n_rows();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DataError::InvalidSplit(format!(
            "{} rows with test fraction {} leaves an empty partition",
            n, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    debug!(train = train_idx.len(), test = test_idx.len(), seed, "Split dataset");

    Ok(TrainTestSplit {
        train: dataset.take_rows(train_idx),
        test: dataset.take_rows(test_idx),
    })
}

/// Where a dataset came from, for reporting
#[derive(Debug, Clone)]
pub struct DataSource {
    pub path: PathBuf,
    pub target_column: String,
}

impl DataSource {
    pub fn new(path: impl Into<PathBuf>, target_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target_column: target_column.into(),
        }
    }

    pub fn load(&self) -> Result<Dataset, DataError> {
        Dataset::from_csv(&self.path, &self.target_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "CRIM,RM,MEDV\n0.1,6.5,24.0\n0.2,5.9,21.6\n0.03,7.1,34.7\n0.05,6.9,33.4\n";

    fn parse(content: &str) -> Result<Dataset, DataError> {
        Dataset::from_reader(content.as_bytes(), Path::new("inline.csv"), "MEDV")
    }

    #[test]
    fn test_parses_features_and_target() {
        let ds = parse(CSV).unwrap();
        assert_eq!(ds.n_rows(), 4);
        assert_eq!(ds.feature_names(), &["CRIM".to_string(), "RM".to_string()]);
        assert_eq!(ds.target()[2], 34.7);
        assert_eq!(ds.features()[[1, 1]], 5.9);
    }

    #[test]
    fn test_repeated_header_rejected() {
        let err = parse("RM,RM,LSTAT,MEDV\n6.5,6.5,4.9,24.0\n5.9,5.9,9.1,21.6\n").unwrap_err();
        match err {
            DataError::Malformed { message, .. } => assert!(message.contains("'RM'")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            parse("RM,MEDV,MEDV\n6.5,24.0,24.0\n").unwrap_err(),
            DataError::Malformed { .. }
        ));
    }

    #[test]
    fn test_target_column_anywhere() {
        let ds = parse("MEDV,RM\n24.0,6.5\n21.6,5.9\n").unwrap();
        assert_eq!(ds.feature_names(), &["RM".to_string()]);
        assert_eq!(ds.target()[1], 21.6);
    }

    #[test]
    fn test_missing_target_column() {
        let err = parse("CRIM,RM\n0.1,6.5\n").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn(c) if c == "MEDV"));
    }

    #[test]
    fn test_non_numeric_cell() {
        let err = parse("CRIM,RM,MEDV\n0.1,six,24.0\n").unwrap_err();
        match err {
            DataError::NonNumeric { column, row, value } => {
                assert_eq!(column, "RM");
                assert_eq!(row, 0);
                assert_eq!(value, "six");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_cell_is_rejected() {
        let err = parse("CRIM,RM,MEDV\n0.1,,24.0\n").unwrap_err();
        assert!(matches!(err, DataError::NonNumeric { .. }));
    }

    #[test]
    fn test_ragged_row() {
        let err = parse("CRIM,RM,MEDV\n0.1,6.5\n").unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(parse("CRIM,RM,MEDV\n").unwrap_err(), DataError::Empty));
    }

    #[test]
    fn test_log_target() {
        let ds = parse(CSV).unwrap();
        let log = ds.log_target().unwrap();
        assert!((log[0] - 24.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_target_rejects_non_positive() {
        let ds = parse("RM,MEDV\n6.0,10.0\n6.1,0.0\n").unwrap();
        assert!(matches!(
            ds.log_target().unwrap_err(),
            DataError::NonPositiveTarget { row: 1, .. }
        ));
    }

    #[test]
    fn test_select_columns_in_requested_order() {
        let ds = parse(CSV).unwrap();
        let x = ds.select_columns(&["RM".to_string(), "CRIM".to_string()]).unwrap();
        assert_eq!(x[[0, 0]], 6.5);
        assert_eq!(x[[0, 1]], 0.1);
        assert!(ds.select_columns(&["TAX".to_string()]).is_err());
    }

    #[test]
    fn test_split_is_disjoint_and_seeded() {
        let rows: String = (1..=20).map(|i| format!("{},{}\n", i, i as f64 + 10.0)).collect();
        let ds = parse(&format!("RM,MEDV\n{}", rows)).unwrap();

        let a = train_test_split(&ds, 0.3, 42).unwrap();
        let b = train_test_split(&ds, 0.3, 42).unwrap();
        assert_eq!(a.test.n_rows(), 6);
        assert_eq!(a.train.n_rows(), 14);
        assert_eq!(a.test.target(), b.test.target());

        let mut all: Vec<f64> = a.train.target().iter().chain(a.test.target().iter()).copied().collect();
        all.sort_by(|x, y| x.partial_cmp(y).unwrap());
        all.dedup();
        assert_eq!(all.len(), 20);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let ds = parse(CSV).unwrap();
        assert!(train_test_split(&ds, 0.0, 1).is_err());
        assert!(train_test_split(&ds, 1.0, 1).is_err());
    }

    #[test]
    fn test_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let ds = DataSource::new(file.path(), "MEDV").load().unwrap();
        assert_eq!(ds.n_rows(), 4);
    }

    #[test]
    fn test_from_csv_missing_file() {
        let err = Dataset::from_csv(Path::new("/nonexistent/boston.csv"), "MEDV").unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
