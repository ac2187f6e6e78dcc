use clap::Args;
use miette::Result;
use rwkit_rw::ArchiveAnalyzer;
use std::path::PathBuf;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// A directory to analyze recursively
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl AnalyzeArgs {
    pub fn handle(&self) -> Result<()> {
        info!("analyzing {}", self.directory.display());

        let mut analyzer = ArchiveAnalyzer::new();
        for entry in WalkDir::new(&self.directory).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            // The full path is kept, install directory names help to date COL1 files
            let name = entry.path().to_string_lossy();
            match std::fs::read(entry.path()) {
                Ok(data) => {
                    analyzer.add(&name, &data);
                }
                Err(err) => analyzer.record_error(&name, err),
            }
        }

        super::print_summary(&analyzer.finish(), self.json)
    }
}
