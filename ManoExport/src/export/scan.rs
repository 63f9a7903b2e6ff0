//! Bundle discovery

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ExportConfig;

/// Bundles of interest in the asset directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleSet {
    /// Every `*.bundle` file, sorted by name
    pub all: Vec<PathBuf>,
    /// Dialogue script bundles, sorted by name
    pub text: Vec<PathBuf>,
    /// Voice bundles, sorted by name
    pub voice: Vec<PathBuf>,
    /// Speaker table bundle, if present
    pub speaker: Option<PathBuf>,
}

/// Find all `*.bundle` files directly inside `dir`, sorted by file name
pub fn find_bundle_files<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("bundle"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Sort the bundles of `asset_root` into text, voice and speaker bundles
#[must_use]
pub fn scan_bundles(asset_root: &Path, config: &ExportConfig) -> BundleSet {
    let all = find_bundle_files(asset_root);
    let has_marker = |path: &Path, marker: &str| {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().contains(marker))
    };

    let text: Vec<_> = all
        .iter()
        .filter(|p| has_marker(p.as_path(), &config.text_bundle_marker))
        .cloned()
        .collect();
    let voice: Vec<_> = all
        .iter()
        .filter(|p| has_marker(p.as_path(), &config.voice_bundle_marker))
        .cloned()
        .collect();
    let speaker = Some(asset_root.join(&config.speaker_bundle)).filter(|p| p.is_file());

    tracing::info!("[SCAN] Found {} bundles in {}", all.len(), asset_root.display());
    tracing::info!("[SCAN] Text bundles: {}", text.len());
    tracing::info!("[SCAN] Voice bundles: {}", voice.len());
    tracing::info!(
        "[SCAN] Speaker bundle: {}",
        asset_root.join(&config.speaker_bundle).display()
    );

    BundleSet {
        all,
        text,
        voice,
        speaker,
    }
}
