// src/config.rs - Analyzer tunables
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::reps::CycleCounter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Used to derive timestamps when the stream does not carry them.
    pub default_fps: f64,
    /// Shorter sequences report zero reps.
    pub min_frames_for_reps: usize,
    pub smoothing_radius: usize,
    pub frames_per_estimated_rep: usize,
    /// Average rep time (seconds) above which tempo counts as controlled.
    pub controlled_tempo_secs: f64,
    pub estimator_timeout_secs: u64,
    pub output_directory: PathBuf,
    /// Where uploaded video is staged; the system temp dir when unset.
    pub staging_directory: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_fps: 30.0,
            min_frames_for_reps: 10,
            smoothing_radius: 3,
            frames_per_estimated_rep: 30,
            controlled_tempo_secs: 2.0,
            estimator_timeout_secs: 300,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("FormAnalyzer")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            staging_directory: None,
        }
    }
}

impl AnalyzerConfig {
    /// Loads overrides from a JSON file; missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn cycle_counter(&self) -> CycleCounter {
        CycleCounter {
            smoothing_radius: self.smoothing_radius,
            frames_per_estimated_rep: self.frames_per_estimated_rep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_constants() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.min_frames_for_reps, 10);
        assert_eq!(config.smoothing_radius, 3);
        assert_eq!(config.frames_per_estimated_rep, 30);
        assert_eq!(config.controlled_tempo_secs, 2.0);
        assert_eq!(config.default_fps, 30.0);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_fps": 60.0, "output_directory": "/tmp/reports"}}"#).unwrap();

        let config = AnalyzerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_fps, 60.0);
        assert_eq!(config.output_directory, PathBuf::from("/tmp/reports"));
        assert_eq!(config.smoothing_radius, 3);
    }

    #[test]
    fn bad_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(AnalyzerConfig::from_file(file.path()).is_err());
    }
}
