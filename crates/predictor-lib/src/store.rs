//! Model artifact persistence
//!
//! File layout: `HPPM` magic, little-endian `u32` format version, SHA-256 of
//! the payload (32 bytes), then the bincode-encoded [`ModelArtifact`].

use crate::error::ArtifactError;
use crate::pipeline::{HyperParams, ModelPipeline};
use crate::selection::SelectedFeatureSet;
use crate::training::search::CandidateScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MAGIC: &[u8; 4] = b"HPPM";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 32;

/// Everything serving needs, persisted as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub pipeline: ModelPipeline,
    pub selected_features: SelectedFeatureSet,
    pub best_params: HyperParams,
    pub cv_score: f64,
    pub leaderboard: Vec<CandidateScore>,
    pub created_at: DateTime<Utc>,
}

/// A loaded artifact plus facts about the file it came from
#[derive(Debug, Clone)]
pub struct StoredModel {
    pub artifact: ModelArtifact,
    pub checksum: String,
    pub size_bytes: usize,
}

impl StoredModel {
    /// Short version tag derived from the payload checksum
    pub fn version(&self) -> &str {
        &self.checksum[..12.min(self.checksum.len())]
    }
}

pub struct ModelStore;

impl ModelStore {
    /// Write `artifact` to `path`, replacing any previous artifact atomically
    pub fn save(artifact: &ModelArtifact, path: &Path) -> Result<String, ArtifactError> {
        let payload = bincode::serialize(artifact).map_err(|e| ArtifactError::Encode(e.to_string()))?;
        let digest = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&artifact.format_version.to_le_bytes());
        bytes.extend_from_slice(&digest);
        bytes.extend_from_slice(&payload);

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| ArtifactError::Io { path, source }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let temp_path = temp_path_for(path);
        let mut file = File::create(&temp_path).map_err(io_err(&temp_path))?;
        file.write_all(&bytes).map_err(io_err(&temp_path))?;
        file.sync_all().map_err(io_err(&temp_path))?;
        fs::rename(&temp_path, path).map_err(io_err(path))?;

        let checksum = hex::encode(digest);
        info!(
            path = %path.display(),
            size = bytes.len(),
            checksum = %checksum,
            "Model artifact saved"
        );
        Ok(checksum)
    }

    pub fn load(path: &Path) -> Result<StoredModel, ArtifactError> {
        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corrupt = |reason: String| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!("file is {} bytes, header needs {}", bytes.len(), HEADER_LEN)));
        }
        if &bytes[..4] != MAGIC {
            return Err(corrupt("bad magic bytes".to_string()));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: version,
                expected: FORMAT_VERSION,
            });
        }

        let expected = &bytes[8..HEADER_LEN];
        let payload = &bytes[HEADER_LEN..];
        let computed = Sha256::digest(payload);
        if computed.as_slice() != expected {
            return Err(corrupt(format!(
                "checksum mismatch: header {}, payload {}",
                hex::encode(expected),
                hex::encode(computed)
            )));
        }

        let artifact: ModelArtifact =
            bincode::deserialize(payload).map_err(|e| corrupt(format!("decode failed: {}", e)))?;
        if !artifact.pipeline.is_fitted() {
            return Err(corrupt("pipeline is not fitted".to_string()));
        }

        Ok(StoredModel {
            artifact,
            checksum: hex::encode(computed),
            size_bytes: bytes.len(),
        })
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
