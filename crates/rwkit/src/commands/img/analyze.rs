use clap::Args;
use miette::Result;
use rwkit_rw::ArchiveAnalyzer;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// An input IMG file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// The directory file of a version 1 archive
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl AnalyzeArgs {
    pub fn handle(&self) -> Result<()> {
        let mut img = super::open_archive(&self.file, self.dir.as_deref())?;
        info!("analyzing {} ({})", self.file.display(), img.version());

        let mut analyzer = ArchiveAnalyzer::new();
        for i in 0..img.len() {
            let name = img.name_for_index(i).unwrap_or_default().to_owned();
            match img.read_entry(i) {
                Ok(data) => {
                    analyzer.add(&name, &data);
                }
                Err(err) => analyzer.record_error(&name, err),
            }
        }

        super::super::print_summary(&analyzer.finish(), self.json)
    }
}
