use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use clap::builder::RangedU64ValueParser;
use rwkit_rw::col::{read_col_models, ColModelHeader, ColVersion};
use rwkit_rw::tree::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use rwkit_rw::{ChunkNode, ChunkType, ChunkWalker, NodeStatus, WalkOptions};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args)]
pub struct TreeArgs {
    /// A RenderWare or COL file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Deepest level whose children are still listed
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_DEPTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_DEPTH_LIMIT as u64),
    )]
    max_depth: usize,

    /// Offset of the root section
    #[arg(long, default_value_t = 0)]
    offset: usize,
}

impl TreeArgs {
    pub fn handle(&self) -> Result<()> {
        let data = super::read_file(&self.file)?;

        // Collision files are a flat list of models rather than a section tree
        if data.get(..4).and_then(ColVersion::from_fourcc).is_some() {
            let models = read_col_models(&data)?;
            for model in &models {
                println!("{}", describe_model(model));
            }
            info!(models = models.len(), "listed {}", self.file.display());
            return Ok(());
        }

        let walker = ChunkWalker::new(
            WalkOptions::builder()
                .offset(self.offset)
                .max_depth(self.max_depth)
                .build(),
        );
        let root = walker.walk(&data)?;

        for (level, node) in root.iter() {
            println!("{}", describe(node, level, &data));
        }

        info!(
            sections = root.node_count(),
            depth = root.depth(),
            "walked {}",
            self.file.display()
        );
        if !root.is_complete() {
            warn!("the section tree is incomplete");
        }

        Ok(())
    }
}

fn describe(node: &ChunkNode, level: usize, data: &[u8]) -> String {
    let header = &node.header;
    let mut line = format!(
        "{}{} [{} bytes @ {:#x}] {}",
        "  ".repeat(level),
        header.kind,
        header.size,
        header.offset,
        header.version()
    );

    if !header.version().is_valid() {
        line.push_str(&format!(" {}", "(unrecognized version)".yellow()));
    }

    if matches!(node.kind(), ChunkType::NODE_NAME | ChunkType::STRING) {
        let text = String::from_utf8_lossy(node.payload(data));
        line.push_str(&format!(" {:?}", text.trim_end_matches('\0')));
    }

    match node.status {
        NodeStatus::Complete => line,
        NodeStatus::Truncated => format!("{} {}", line, "(truncated)".red()),
        NodeStatus::MaxDepthExceeded => format!("{} {}", line, "(max depth)".yellow()),
    }
}

fn describe_model(model: &ColModelHeader) -> String {
    format!(
        "{} {:?} [{} bytes @ {:#x}] model {}",
        model.version, model.name, model.size, model.offset, model.model_id
    )
}
