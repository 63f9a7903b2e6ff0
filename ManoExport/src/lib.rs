//! # manoexport
//!
//! Exports the localized dialogue and voice clips of a visual-novel install
//! into a spreadsheet-friendly CSV plus a folder of audio files.
//!
//! ## Output
//!
//! - **`dialogue.csv`** - `line_id, speaker_ja, speaker_zh, line_ja, line_zh, voice_file`
//!   (UTF-8 with BOM, CRLF)
//! - **`voices/`** - one file per audio sample, never overwritten
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use manoexport::{ExportConfig, UnityFsSource, run_export};
//!
//! let summary = run_export(
//!     &ExportConfig::default(),
//!     Path::new("/games/manosaba_game"),
//!     Path::new("output"),
//!     &UnityFsSource,
//!     &|_progress| {},
//! )?;
//! println!("{} records, {} with voice", summary.records, summary.matched);
//! # Ok::<(), manoexport::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default) - Enables the `manoexport` command-line binary

pub mod config;
pub mod error;
pub mod export;
pub mod script;
pub mod source;
pub mod speakers;
pub mod voice;

// Re-exports for convenience
pub use config::ExportConfig;
pub use error::{Error, Result};
pub use export::{BundleFailure, ExportPhase, ExportProgress, ExportSummary, run_export};
pub use script::{DialogueRecord, ScriptParser, parse_script};
pub use source::{AssetSource, MemoryAsset, MemorySource, UnityFsSource};
pub use speakers::SpeakerMap;
pub use voice::VoiceMap;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
