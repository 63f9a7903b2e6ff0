//! CLI progress display utilities

use std::time::Duration;

use console::{Emoji, style};
use indicatif::HumanDuration;

use crate::export::{ExportProgress, ExportSummary, format_progress};

/// Magnifying glass - for reading/scanning operations
pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
/// Speaker - for voice export
pub static SPEAKER: Emoji<'_, '_> = Emoji("🔊 ", "");
/// Warning sign - for partial failures
pub static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "!! ");
/// Sparkles - for completion
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

/// Log one progress event as `[STAGE] current/total (pct%) | detail`
pub fn log_progress(progress: &ExportProgress) {
    tracing::info!("{}", format_progress(progress));
}

/// Print a banner line: `🔍 Message`
pub fn print_banner(emoji: Emoji, msg: &str) {
    println!("{}{}", emoji, style(msg).bold());
}

/// Print the completion block for a finished export
pub fn print_done(summary: &ExportSummary) {
    println!(
        "{}{} records, {} with voice, {} new voice files",
        SPEAKER,
        style(summary.records).bold(),
        style(summary.matched).green(),
        summary.files_written
    );
    if summary.has_failures() {
        let failed = summary.text_failures.len()
            + summary.voice_failures.len()
            + usize::from(summary.speaker_failure.is_some());
        println!(
            "{}{}",
            WARNING,
            style(format!("{failed} bundle(s) could not be read, see the log above")).yellow()
        );
    }
    print_elapsed(summary.elapsed);
}

/// Print completion message: `✨ Done in 2s`
pub fn print_elapsed(elapsed: Duration) {
    println!("{} Done in {}", SPARKLE, HumanDuration(elapsed));
}
