//! Speaker name mapping
//!
//! The game ships a `CharacterNames` text asset with one `Key:Display` pair
//! per line. Script speakers are looked up against it with a few spelling
//! variants, see [`speaker_candidates`].

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::path::Path;

use unitybundle::AssetObject;

use crate::error::Result;
use crate::source::AssetSource;

/// Source-language speaker key → display name
pub type SpeakerMap = HashMap<String, String>;

/// Prefix some script speakers carry that the name table omits
pub const CREATURE_PREFIX: &str = "Creature";

/// Parse `KEY:VALUE` lines into a map
///
/// Lines without a colon or with an empty side are skipped. The first
/// occurrence of a key wins.
#[must_use]
pub fn parse_speaker_table(text: &str) -> SpeakerMap {
    let mut map = SpeakerMap::new();
    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        map.entry(key.to_string()).or_insert_with(|| value.to_string());
    }
    map
}

/// Lookup keys for a speaker, in priority order, de-duplicated, never empty strings
///
/// 1. the name as written
/// 2. the name without a leading `Creature` (only if something follows it)
/// 3. the name trimmed of whitespace
#[must_use]
pub fn speaker_candidates(name: &str) -> Vec<String> {
    let mut raw = vec![name];
    if let Some(stripped) = name.strip_prefix(CREATURE_PREFIX)
        && !stripped.is_empty()
    {
        raw.push(stripped);
    }
    raw.push(name.trim());

    let mut candidates: Vec<String> = Vec::with_capacity(raw.len());
    for key in raw {
        if !key.is_empty() && !candidates.iter().any(|c| c == key) {
            candidates.push(key.to_string());
        }
    }
    candidates
}

/// Display name for a speaker, falling back to the name itself
#[must_use]
pub fn resolve_display_name(map: &SpeakerMap, speaker: &str) -> String {
    speaker_candidates(speaker)
        .iter()
        .find_map(|key| map.get(key))
        .cloned()
        .unwrap_or_else(|| speaker.to_string())
}

/// Load the speaker map from the first text asset named `asset_name` in `bundle`
///
/// Returns an empty map if the bundle has no such asset.
pub fn build_speaker_map(
    source: &dyn AssetSource,
    bundle: &Path,
    asset_name: &str,
) -> Result<SpeakerMap> {
    tracing::info!("[MAP] Reading speaker bundle: {}", bundle.display());

    let mut map = SpeakerMap::new();
    source.visit_bundle(bundle, &mut |asset| {
        if let AssetObject::TextAsset(text) = asset
            && text.name == asset_name
        {
            map = parse_speaker_table(&text.text());
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    })?;

    tracing::info!("[MAP] Speaker entries: {}", map.len());
    Ok(map)
}
