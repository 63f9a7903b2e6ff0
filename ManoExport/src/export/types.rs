//! Types for export progress and results

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::Result;

// ============================================================================
// Progress Types
// ============================================================================

/// Progress callback type for export runs
pub type ExportProgressCallback<'a> = &'a dyn Fn(&ExportProgress);

/// Progress information during an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportProgress {
    /// Current stage
    pub phase: ExportPhase,
    /// Current bundle number (1-indexed)
    pub current: usize,
    /// Total number of bundles in this stage
    pub total: usize,
    /// Free-form detail, usually the bundle being read
    pub detail: Option<String>,
}

impl ExportProgress {
    #[must_use]
    pub fn new(phase: ExportPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(
        phase: ExportPhase,
        current: usize,
        total: usize,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            detail: Some(detail.into()),
        }
    }

    /// Percentage in `0.0..=100.0`, 0 when there is nothing to do
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 * 100.0 / self.total as f64
        }
    }
}

/// Stage of an export run that reports per-bundle progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// Parsing dialogue script bundles
    Text,
    /// Exporting voice bundles
    Voice,
}

impl ExportPhase {
    /// Log tag for this stage
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Voice => "VOICE",
        }
    }
}

/// `[STAGE] current/total (pct%) | detail`
#[must_use]
pub fn format_progress(progress: &ExportProgress) -> String {
    let mut line = format!(
        "[{}] {}/{} ({:.1}%)",
        progress.phase.as_str(),
        progress.current,
        progress.total,
        progress.percentage()
    );
    if let Some(detail) = progress.detail.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(" | ");
        line.push_str(detail);
    }
    line
}

// ============================================================================
// Result Types
// ============================================================================

/// A bundle that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleFailure {
    /// Bundle file name
    pub bundle: String,
    /// Error detail
    pub reason: String,
}

impl BundleFailure {
    pub fn new(bundle: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            bundle: bundle.into(),
            reason: reason.to_string(),
        }
    }
}

/// Totals for a finished export run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    /// Text bundles found
    pub text_bundles: usize,
    /// Voice bundles found
    pub voice_bundles: usize,
    /// Dialogue records written to the CSV
    pub records: usize,
    /// Distinct clip names in the merged voice map
    pub voice_entries: usize,
    /// Records with a voice file
    pub matched: usize,
    /// Records without a voice file
    pub missing_voice: usize,
    /// Records whose speaker has no display name
    pub unmapped_speakers: usize,
    pub speaker_entries: usize,
    /// Set when the speaker bundle exists but could not be read
    pub speaker_failure: Option<BundleFailure>,
    pub text_failures: Vec<BundleFailure>,
    pub voice_failures: Vec<BundleFailure>,
    /// New voice files this run
    pub files_written: usize,
    pub bytes_written: u64,
    pub csv_path: PathBuf,
    pub voices_dir: PathBuf,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl ExportSummary {
    /// Whether any bundle failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.speaker_failure.is_some()
            || !self.text_failures.is_empty()
            || !self.voice_failures.is_empty()
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn serialize_secs<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}
