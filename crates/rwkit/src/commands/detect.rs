use clap::Args;
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use rwkit_rw::{classify, FileFormat};
use std::path::PathBuf;

#[derive(Args)]
pub struct DetectArgs {
    /// Files to classify
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Print one JSON object per file
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl DetectArgs {
    pub fn handle(&self) -> Result<()> {
        for path in &self.files {
            let data = super::read_file(path)?;
            let hint = path.to_string_lossy();

            match classify(&data, Some(hint.as_ref())) {
                Ok(result) if self.json => {
                    let value = serde_json::json!({ "path": hint, "result": result });
                    println!("{}", serde_json::to_string(&value).into_diagnostic()?);
                }
                Ok(result) if result.format == FileFormat::Unknown => {
                    println!("{}: {}", path.display(), result.yellow());
                }
                Ok(result) => println!("{}: {}", path.display(), result.green()),
                Err(err) if self.json => {
                    let value = serde_json::json!({ "path": hint, "error": err.to_string() });
                    println!("{}", serde_json::to_string(&value).into_diagnostic()?);
                }
                Err(err) => println!("{}: {}", path.display(), err.red()),
            }
        }

        Ok(())
    }
}
