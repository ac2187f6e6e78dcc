use std::path::Path;

use itertools::Itertools;
use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use rwkit_rw::ArchiveSummary;

pub mod analyze;
pub mod detect;
pub mod img;
pub mod tree;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Detect the format and game of loose files
    Detect(detect::DetectArgs),
    /// Print the section tree of a RenderWare file
    Tree(tree::TreeArgs),
    /// Summarize every file below a directory
    Analyze(analyze::AnalyzeArgs),
    /// Handle IMG archives
    Img {
        #[command(subcommand)]
        command: img::ImgCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Detect(detect) => detect.handle(),
            Commands::Tree(tree) => tree.handle(),
            Commands::Analyze(analyze) => analyze.handle(),
            Commands::Img { command } => command.handle(),
        }
    }
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))
}

pub(crate) fn print_summary(summary: &ArchiveSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary).into_diagnostic()?);
        return Ok(());
    }

    println!(
        "{} entries, {} analyzed, {} errored, {} by extension only",
        summary.total_entries,
        summary.analyzed(),
        summary.errored,
        summary.filename_fallbacks
    );
    println!(
        "formats:  {}",
        summary
            .counts_by_format
            .iter()
            .map(|(format, count)| format!("{format}: {count}"))
            .join(", ")
    );
    println!(
        "games:    {}",
        summary
            .counts_by_game
            .iter()
            .map(|(game, count)| format!("{game}: {count}"))
            .join(", ")
    );
    println!(
        "versions: {}",
        summary
            .counts_by_version
            .iter()
            .map(|(version, count)| format!("{version}: {count}"))
            .join(", ")
    );

    for error in &summary.errors {
        println!("❌ {}: {}", error.name, error.reason.red());
    }

    Ok(())
}
