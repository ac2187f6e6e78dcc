use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use rwkit_rw::{classify, FileFormat};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct ListArgs {
    /// An input IMG file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// The directory file of a version 1 archive
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let mut img = super::open_archive(&self.file, self.dir.as_deref())?;
        info!(
            entries = img.len(),
            bytes = img.total_size(),
            "{} ({})",
            self.file.display(),
            img.version()
        );

        for i in 0..img.len() {
            let name = img.name_for_index(i).unwrap_or_default().to_owned();
            let size = img.entry(i).map(|e| e.size()).unwrap_or_default();

            let detection = match img.read_entry(i) {
                Ok(data) => match classify(&data, Some(name.as_str())) {
                    Ok(result) if result.format == FileFormat::Unknown => {
                        result.yellow().to_string()
                    }
                    Ok(result) => result.to_string(),
                    Err(err) => err.red().to_string(),
                },
                Err(err) => err.red().to_string(),
            };

            println!("{i:>5} {name:<24} {size:>10} {detection}");
        }

        Ok(())
    }
}
