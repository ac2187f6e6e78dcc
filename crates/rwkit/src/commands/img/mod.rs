use miette::{miette, Context, IntoDiagnostic, Result};
use rwkit_img::{error::Error, ImgArchive};
use std::{fs::File, path::Path};
use tracing::info;

pub mod analyze;
pub mod list;

#[derive(clap::Subcommand)]
pub enum ImgCommands {
    /// List the entries of an IMG archive with their detected format
    List(list::ListArgs),
    /// Summarize the entries of an IMG archive
    Analyze(analyze::AnalyzeArgs),
}

impl ImgCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            ImgCommands::List(list) => list.handle(),
            ImgCommands::Analyze(analyze) => analyze.handle(),
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))
}

/// Open an archive, falling back to a `.dir` file next to it when it has no embedded directory
pub(crate) fn open_archive(file: &Path, directory: Option<&Path>) -> Result<ImgArchive<File>> {
    if let Some(directory) = directory {
        return Ok(ImgArchive::with_directory(open(directory)?, open(file)?)?);
    }

    match ImgArchive::new(open(file)?) {
        Err(Error::InvalidArchive) => {
            let directory = file.with_extension("dir");
            if !directory.is_file() {
                return Err(miette!(
                    "{} is not a version 2 archive and has no {} next to it",
                    file.display(),
                    directory.display()
                ));
            }
            info!("reading directory from {}", directory.display());
            Ok(ImgArchive::with_directory(open(&directory)?, open(file)?)?)
        }
        archive => Ok(archive?),
    }
}
