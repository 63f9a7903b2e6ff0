//! Voice clip export
//!
//! Audio payloads are copied to the voices directory under their sample file
//! names. Existing files are never overwritten, so rerunning an export only
//! writes what is missing.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::Path;

use unitybundle::AssetObject;

use crate::error::Result;
use crate::source::AssetSource;

/// Clip name → exported file name
pub type VoiceMap = HashMap<String, String>;

/// What one voice bundle contributed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceBundleExport {
    /// First sample file per clip name, first clip wins
    pub voice_map: VoiceMap,
    /// Clips that had at least one sample
    pub clips: usize,
    pub files_written: usize,
    pub bytes_written: u64,
}

/// Export every audio clip of one bundle into `voices_dir`
///
/// Clips without samples are skipped. `progress_interval` controls how often
/// a progress line is logged (0 disables it).
pub fn export_voice_bundle(
    source: &dyn AssetSource,
    bundle: &Path,
    voices_dir: &Path,
    progress_interval: usize,
) -> Result<VoiceBundleExport> {
    let bundle_name = bundle
        .file_name()
        .map_or_else(|| bundle.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut export = VoiceBundleExport::default();

    source.visit_bundle(bundle, &mut |asset| {
        let AssetObject::AudioClip(clip) = asset else {
            return Ok(ControlFlow::Continue(()));
        };
        if clip.samples.is_empty() {
            return Ok(ControlFlow::Continue(()));
        }
        export.clips += 1;

        for sample in &clip.samples {
            let Some(file_name) = Path::new(&sample.file_name).file_name() else {
                tracing::warn!("[VOICE] Skipping sample with unusable name: {:?}", sample.file_name);
                continue;
            };
            if write_new_file(&voices_dir.join(file_name), sample.data)? {
                export.files_written += 1;
                export.bytes_written += sample.data.len() as u64;
            }

            if !clip.name.is_empty() && !export.voice_map.contains_key(&clip.name) {
                export
                    .voice_map
                    .insert(clip.name.clone(), file_name.to_string_lossy().into_owned());
            }
        }

        if progress_interval > 0 && export.clips % progress_interval == 0 {
            tracing::info!(
                "[VOICE] {} processed {} clips, {} files written",
                bundle_name,
                export.clips,
                export.files_written
            );
        }
        Ok(ControlFlow::Continue(()))
    })?;

    tracing::info!(
        "[VOICE] {} done: clips={}, new files={}, mapped={}",
        bundle_name,
        export.clips,
        export.files_written,
        export.voice_map.len()
    );
    Ok(export)
}

/// Write `data` to `path` unless the file already exists
///
/// Returns whether anything was written.
fn write_new_file(path: &Path, data: &[u8]) -> io::Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    file.write_all(data)?;
    Ok(true)
}

/// Merge a bundle's map into the run-wide one, keeping existing entries
pub fn merge_voice_map(target: &mut VoiceMap, partial: VoiceMap) {
    for (clip, file) in partial {
        target.entry(clip).or_insert(file);
    }
}
