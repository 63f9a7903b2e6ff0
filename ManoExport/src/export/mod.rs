//! Export orchestration
//!
//! Runs the whole pipeline for one game install: scan the asset directory,
//! load the speaker table, parse every script bundle, export every voice
//! bundle, join the two by line id and write the CSV.
//!
//! A bundle that fails is logged and recorded in the summary. Only setup
//! problems (missing asset directory, unwritable output) abort the run.

pub mod csv;
pub mod scan;
pub mod types;

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::script::{DialogueRecord, parse_script_bundle};
use crate::source::AssetSource;
use crate::speakers::{SpeakerMap, build_speaker_map};
use crate::voice::{VoiceBundleExport, VoiceMap, export_voice_bundle, merge_voice_map};

pub use csv::{CSV_HEADER, write_dialogue, write_dialogue_csv};
pub use scan::{BundleSet, find_bundle_files, scan_bundles};
pub use types::{
    BundleFailure, ExportPhase, ExportProgress, ExportProgressCallback, ExportSummary,
    format_progress,
};

/// Counts produced by [`join_voices`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub matched: usize,
    pub missing_voice: usize,
    pub unmapped_speakers: usize,
}

/// Run a full export
///
/// # Errors
/// Fails if the asset directory is missing, the output directory cannot be
/// created, or the CSV cannot be written. Per-bundle errors are reported in
/// the returned summary instead.
pub fn run_export(
    config: &ExportConfig,
    game_root: &Path,
    output_dir: &Path,
    source: &dyn AssetSource,
    progress: ExportProgressCallback<'_>,
) -> Result<ExportSummary> {
    let start = Instant::now();

    let asset_root = config.asset_root(game_root);
    if !asset_root.is_dir() {
        return Err(Error::AssetRootNotFound { path: asset_root });
    }

    fs::create_dir_all(output_dir)?;
    let voices_dir = output_dir.join(&config.voices_dir_name);
    fs::create_dir_all(&voices_dir)?;

    let bundles = scan_bundles(&asset_root, config);

    let mut speaker_failure = None;
    let speakers = match &bundles.speaker {
        Some(path) => load_speakers(source, path, &config.speaker_asset).unwrap_or_else(|failure| {
            speaker_failure = Some(failure);
            SpeakerMap::new()
        }),
        None => {
            tracing::warn!("[MAP] Speaker bundle not found, speaker_zh falls back to speaker_ja");
            SpeakerMap::new()
        }
    };

    let mut records: Vec<DialogueRecord> = Vec::new();
    let mut text_failures = Vec::new();
    let total = bundles.text.len();
    for (i, bundle) in bundles.text.iter().enumerate() {
        progress(&ExportProgress::with_detail(
            ExportPhase::Text,
            i + 1,
            total,
            format!("reading {}", bundle_name(bundle)),
        ));
        match parse_text_bundle(source, bundle, &speakers) {
            Ok(parsed) => {
                records.extend(parsed);
                tracing::info!(
                    "[TEXT] {} total records after {}",
                    records.len(),
                    bundle_name(bundle)
                );
            }
            Err(failure) => text_failures.push(failure),
        }
    }

    let mut voice_map = VoiceMap::new();
    let mut voice_failures = Vec::new();
    let (mut files_written, mut bytes_written) = (0, 0);
    let total = bundles.voice.len();
    for (i, bundle) in bundles.voice.iter().enumerate() {
        progress(&ExportProgress::with_detail(
            ExportPhase::Voice,
            i + 1,
            total,
            format!("reading {}", bundle_name(bundle)),
        ));
        match export_voices(source, bundle, &voices_dir, config.progress_interval) {
            Ok(export) => {
                files_written += export.files_written;
                bytes_written += export.bytes_written;
                merge_voice_map(&mut voice_map, export.voice_map);
            }
            Err(failure) => voice_failures.push(failure),
        }
    }

    let stats = join_voices(&mut records, &voice_map);

    let csv_path = output_dir.join(&config.csv_file_name);
    write_dialogue_csv(&records, &csv_path)?;

    let summary = ExportSummary {
        text_bundles: bundles.text.len(),
        voice_bundles: bundles.voice.len(),
        records: records.len(),
        voice_entries: voice_map.len(),
        matched: stats.matched,
        missing_voice: stats.missing_voice,
        unmapped_speakers: stats.unmapped_speakers,
        speaker_entries: speakers.len(),
        speaker_failure,
        text_failures,
        voice_failures,
        files_written,
        bytes_written,
        csv_path,
        voices_dir,
        elapsed: start.elapsed(),
    };
    log_summary(&summary);
    Ok(summary)
}

/// Fill in `voice_file` for each record and count the outcome
pub fn join_voices(records: &mut [DialogueRecord], voice_map: &VoiceMap) -> JoinStats {
    let mut stats = JoinStats::default();
    for record in records {
        record.voice_file = voice_map.get(&record.line_id).cloned().unwrap_or_default();
        if record.voice_file.is_empty() {
            stats.missing_voice += 1;
        } else {
            stats.matched += 1;
        }
        if !record.speaker_ja.is_empty() && record.speaker_zh == record.speaker_ja {
            stats.unmapped_speakers += 1;
        }
    }
    stats
}

fn load_speakers(
    source: &dyn AssetSource,
    bundle: &Path,
    asset_name: &str,
) -> std::result::Result<SpeakerMap, BundleFailure> {
    build_speaker_map(source, bundle, asset_name).map_err(|e| {
        let name = bundle_name(bundle);
        tracing::error!("[MAP] Failed to read speaker table: {name} | {e}");
        BundleFailure::new(name, e)
    })
}

fn parse_text_bundle(
    source: &dyn AssetSource,
    bundle: &Path,
    speakers: &SpeakerMap,
) -> std::result::Result<Vec<DialogueRecord>, BundleFailure> {
    parse_script_bundle(source, bundle, speakers).map_err(|e| {
        let name = bundle_name(bundle);
        tracing::error!("[TEXT] Failed: {name} | {e}");
        BundleFailure::new(name, e)
    })
}

fn export_voices(
    source: &dyn AssetSource,
    bundle: &Path,
    voices_dir: &Path,
    progress_interval: usize,
) -> std::result::Result<VoiceBundleExport, BundleFailure> {
    export_voice_bundle(source, bundle, voices_dir, progress_interval).map_err(|e| {
        let name = bundle_name(bundle);
        tracing::error!("[VOICE] Failed: {name} | {e}");
        BundleFailure::new(name, e)
    })
}

fn bundle_name(bundle: &Path) -> String {
    bundle
        .file_name()
        .map_or_else(|| bundle.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn log_summary(summary: &ExportSummary) {
    tracing::info!("[DONE] Export finished");
    tracing::info!("[DONE] Dialogue records: {}", summary.records);
    tracing::info!("[DONE] Voice map entries: {}", summary.voice_entries);
    tracing::info!("[DONE] Matched voices: {}", summary.matched);
    tracing::warn!("[DONE] Missing voices: {}", summary.missing_voice);
    tracing::warn!("[DONE] Unmapped speaker names: {}", summary.unmapped_speakers);
    if summary.has_failures() {
        tracing::warn!(
            "[DONE] Failed bundles: {} speaker, {} text, {} voice",
            usize::from(summary.speaker_failure.is_some()),
            summary.text_failures.len(),
            summary.voice_failures.len()
        );
    }
    tracing::info!(
        "[DONE] New voice files: {} ({} bytes)",
        summary.files_written,
        summary.bytes_written
    );
    tracing::info!("[DONE] CSV: {}", summary.csv_path.display());
    tracing::info!("[DONE] Voices: {}", summary.voices_dir.display());
    tracing::info!("[DONE] Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
}
