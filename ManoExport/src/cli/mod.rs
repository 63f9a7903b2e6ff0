//! manoexport CLI - export dialogue and voices from a game install

pub mod progress;

use std::path::{Path, PathBuf};

use clap::Parser;
use console::Term;
use tracing::Level;

use crate::config::ExportConfig;
use crate::error::Error;
use crate::export::run_export;
use crate::source::UnityFsSource;

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser)]
#[command(name = "manoexport", version)]
#[command(
    about = "Export localized dialogue and voice clips to CSV",
    long_about = "Reads the game's asset bundles and writes dialogue.csv plus a voices/ folder. \
                  Game files are only read, never modified."
)]
struct Cli {
    /// Game install directory (prompted for if omitted)
    #[arg(long, short = 'g', value_name = "DIR")]
    game_root: Option<PathBuf>,

    /// Output directory (prompted for if omitted, empty answer means ./output)
    #[arg(long, short = 'o', value_name = "DIR")]
    output: Option<PathBuf>,

    /// TOML file overriding bundle names and other settings
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the run summary as JSON
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

/// Run the manoexport CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let max_level = if cli.quiet { Level::WARN } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(max_level).init();

    tracing::info!("manoexport {} starting", crate::VERSION);
    tracing::info!("The game directory is only read, game files are never modified");

    let term = Term::stdout();

    let game_root = match cli.game_root {
        Some(path) => path,
        None => PathBuf::from(clean_path_input(&prompt(
            &term,
            "Game root directory (e.g. C:\\Steam\\steamapps\\common\\manosaba_game):",
        )?)),
    };
    if game_root.as_os_str().is_empty() {
        tracing::error!("No game root given, exiting");
        return Err(Error::InvalidGameRoot { path: game_root }.into());
    }
    if !game_root.is_dir() {
        tracing::error!("Path does not exist or is not a directory: {}", game_root.display());
        return Err(Error::InvalidGameRoot { path: game_root }.into());
    }

    let output_dir = match cli.output {
        Some(path) => path,
        None => {
            let answer = clean_path_input(&prompt(
                &term,
                "Output directory (leave empty for ./output):",
            )?);
            resolve_output_dir(&answer, &std::env::current_dir()?)
        }
    };
    tracing::info!("Output directory: {}", output_dir.display());

    let config = ExportConfig::resolve(cli.config.as_deref())?;

    if !cli.quiet {
        progress::print_banner(progress::LOOKING_GLASS, "Scanning asset bundles...");
    }
    let summary = run_export(
        &config,
        &game_root,
        &output_dir,
        &UnityFsSource,
        &progress::log_progress,
    )
    .inspect_err(|e| tracing::error!("{}", failure_message(e)))?;

    if let Some(path) = &cli.summary {
        summary.write_json(path)?;
        tracing::info!("[DONE] Summary written: {}", path.display());
    }

    if !cli.quiet {
        progress::print_done(&summary);
    }

    Ok(())
}

fn failure_message(error: &Error) -> String {
    format!("[RUN] Export failed: {error}")
}

fn prompt(term: &Term, question: &str) -> std::io::Result<String> {
    term.write_line(question)?;
    term.write_str("> ")?;
    term.read_line()
}

/// Trim whitespace and surrounding double quotes from a typed or pasted path
fn clean_path_input(input: &str) -> String {
    input.trim().trim_matches('"').to_string()
}

/// Empty answer means `<cwd>/output`
fn resolve_output_dir(answer: &str, cwd: &Path) -> PathBuf {
    if answer.is_empty() {
        cwd.join(DEFAULT_OUTPUT_DIR)
    } else {
        PathBuf::from(answer)
    }
}
