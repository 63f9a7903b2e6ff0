//! Dialogue script parser
//!
//! Localized scripts are plain text with a marker line per dialogue entry,
//! the Japanese source text kept as `;` comments and the translation as bare
//! lines:
//!
//! ```text
//! # 0101Trial00_Leia001
//! ; > Leia: |#0101Trial00_Leia001|
//! ; 日本語 <ja>
//! ; こんにちは
//! 你好
//! ```
//!
//! [`ScriptParser`] turns that into [`DialogueRecord`]s one line at a time.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unitybundle::AssetObject;

use crate::error::Result;
use crate::source::AssetSource;
use crate::speakers::{SpeakerMap, resolve_display_name};

const MARKER_PREFIX: &str = "# ";
const DIRECTIVE_PREFIX: &str = "; > ";
const COMMENT_PREFIX: &str = ";";
/// First Japanese comment line of each block names the language, not dialogue
const LANGUAGE_TAG: &str = "日本語 <ja>";

/// One dialogue entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub line_id: String,
    pub speaker_ja: String,
    pub speaker_zh: String,
    pub line_ja: String,
    pub line_zh: String,
    /// Set by the voice join, empty until then
    pub voice_file: String,
}

/// Line-oriented state machine over one script
///
/// Feed lines with [`consume`](Self::consume), then call
/// [`finish`](Self::finish) to flush the last open entry.
#[derive(Debug)]
pub struct ScriptParser<'m> {
    speakers: &'m SpeakerMap,
    line_id: Option<String>,
    speaker: Option<String>,
    ja_lines: Vec<String>,
    zh_lines: Vec<String>,
    records: Vec<DialogueRecord>,
}

impl<'m> ScriptParser<'m> {
    #[must_use]
    pub fn new(speakers: &'m SpeakerMap) -> Self {
        Self {
            speakers,
            line_id: None,
            speaker: None,
            ja_lines: Vec::new(),
            zh_lines: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Process one line (without its terminator)
    pub fn consume(&mut self, line: &str) {
        if let Some(id) = line.strip_prefix(MARKER_PREFIX) {
            self.flush();
            self.line_id = Some(id.trim().to_string());
            return;
        }

        if self.line_id.is_none() {
            return;
        }

        if let Some(directive) = line.strip_prefix(DIRECTIVE_PREFIX) {
            if let Some((name, _)) = directive.trim().split_once(':') {
                let name = name.trim();
                if !name.is_empty() && !name.starts_with('@') {
                    self.speaker = Some(name.to_string());
                }
            }
            return;
        }

        if let Some(comment) = line.strip_prefix(COMMENT_PREFIX) {
            let ja = comment.trim_start();
            if !ja.is_empty() && !ja.starts_with(LANGUAGE_TAG) {
                self.ja_lines.push(ja.to_string());
            }
            return;
        }

        if !line.trim().is_empty() {
            self.zh_lines.push(line.trim_end().to_string());
        }
    }

    /// Emit the open entry, if any, and reset the state
    ///
    /// An entry whose marker carried an empty id is dropped.
    pub fn flush(&mut self) {
        let speaker = self.speaker.take();
        let ja_lines = std::mem::take(&mut self.ja_lines);
        let zh_lines = std::mem::take(&mut self.zh_lines);
        let Some(line_id) = self.line_id.take().filter(|id| !id.is_empty()) else {
            return;
        };

        let speaker_ja = speaker.unwrap_or_else(|| speaker_from_line_id(&line_id));
        let speaker_zh = resolve_display_name(self.speakers, &speaker_ja);

        self.records.push(DialogueRecord {
            line_id,
            speaker_ja,
            speaker_zh,
            line_ja: join_fragments(&ja_lines),
            line_zh: join_fragments(&zh_lines),
            voice_file: String::new(),
        });
    }

    /// Records emitted so far
    #[must_use]
    pub fn records(&self) -> &[DialogueRecord] {
        &self.records
    }

    /// Flush and hand back every record
    #[must_use]
    pub fn finish(mut self) -> Vec<DialogueRecord> {
        self.flush();
        self.records
    }
}

fn join_fragments(lines: &[String]) -> String {
    lines
        .iter()
        .filter(|l| !l.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn speaker_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_]*?)(\d+)?$").expect("valid regex"))
}

/// Speaker encoded in a line id such as `0101Trial00_Leia001`
///
/// Takes everything after the first underscore and drops a trailing run of
/// digits. Ids without an underscore give an empty speaker.
#[must_use]
pub fn speaker_from_line_id(line_id: &str) -> String {
    let Some((_, tail)) = line_id.split_once('_') else {
        return String::new();
    };
    speaker_suffix_regex()
        .captures(tail)
        .and_then(|caps| caps.get(1))
        .map_or(tail, |m| m.as_str())
        .to_string()
}

/// Split on `\n`, `\r\n` and lone `\r`
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix(['\n', '\r']))
        .unwrap_or(text);
    let mut rest = Some(text).filter(|t| !t.is_empty());
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\n', '\r']) {
            Some(pos) => {
                let skip = if current[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[pos + skip..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Parse one script's text
#[must_use]
pub fn parse_script(text: &str, speakers: &SpeakerMap) -> Vec<DialogueRecord> {
    let mut parser = ScriptParser::new(speakers);
    for line in split_lines(text) {
        parser.consume(line);
    }
    parser.finish()
}

/// Parse every text asset in a script bundle, in container order
pub fn parse_script_bundle(
    source: &dyn AssetSource,
    bundle: &Path,
    speakers: &SpeakerMap,
) -> Result<Vec<DialogueRecord>> {
    let mut records = Vec::new();
    source.visit_bundle(bundle, &mut |asset| {
        if let AssetObject::TextAsset(script) = asset {
            records.extend(parse_script(&script.text(), speakers));
            tracing::info!(
                "[TEXT] TextAsset={} parsed, {} records so far",
                script.name,
                records.len()
            );
        }
        Ok(ControlFlow::Continue(()))
    })?;
    Ok(records)
}
