// src/export.rs
use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::AnalysisOutcome;
use crate::angles::Joint;
use crate::feedback::FeedbackReport;
use crate::rules::Checkpoint;
use crate::scoring::FrameRecord;

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub report: PathBuf,
    pub frames: PathBuf,
}

/// Writes analysis results into `<output_dir>/<session_name>/`.
pub struct ReportExporter {
    output_dir: PathBuf,
    session_name: String,
}

impl ReportExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
        }
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn export(&self, outcome: &AnalysisOutcome) -> Result<ExportPaths> {
        let paths = ExportPaths {
            report: self.export_report(&outcome.report)?,
            frames: self.export_frames(&outcome.records)?,
        };
        info!("Exported {} analysis to {}", outcome.exercise, self.session_dir().display());
        Ok(paths)
    }

    pub fn export_report(&self, report: &FeedbackReport) -> Result<PathBuf> {
        let path = self.prepare("report.json")?;
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, report)?;
        Ok(path)
    }

    /// One row per frame: angles, then one column per scored checkpoint.
    /// Angles that could not be measured are left empty.
    pub fn export_frames(&self, records: &[FrameRecord]) -> Result<PathBuf> {
        let path = self.prepare("frame_scores.csv")?;
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        // Every record of one run is scored against the same rule set.
        let checkpoints: Vec<Checkpoint> = records
            .first()
            .map(|r| r.form_scores.keys().copied().collect())
            .unwrap_or_default();

        let mut header = vec!["frame".to_string(), "timestamp".to_string()];
        header.extend(Joint::ALL.iter().map(|j| format!("{}_angle", j.name())));
        header.extend(checkpoints.iter().map(|c| c.name().to_string()));
        writer.write_record(&header)?;

        for record in records {
            let mut row = vec![record.frame.to_string(), record.timestamp.to_string()];
            row.extend(Joint::ALL.iter().map(|j| {
                record.angles.get(j).map(|a| a.to_string()).unwrap_or_default()
            }));
            row.extend(checkpoints.iter().map(|c| {
                record.form_scores.get(c).map(|s| s.to_string()).unwrap_or_default()
            }));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(path)
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        let dir = self.session_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir.join(file_name))
    }
}
