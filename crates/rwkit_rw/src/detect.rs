//! Classification of asset buffers.

use std::ffi::OsStr;
use std::path::Path;

use derive_more::Display;
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkType;
use crate::col::ColVersion;
use crate::error::{Error, Result};
use crate::tree::{walk_chunks, DEFAULT_MAX_DEPTH};
use crate::version::{GameLabel, VersionInfo};

/// Kind of asset a buffer holds
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FileFormat {
    #[display("DFF")]
    Dff,
    #[display("TXD")]
    Txd,
    #[display("COL1")]
    Col1,
    #[display("COL2")]
    Col2,
    #[display("COL3")]
    Col3,
    #[display("COL4")]
    Col4,
    #[display("Unknown")]
    Unknown,
}

impl FileFormat {
    /// Usual file extension, without the dot
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            FileFormat::Dff => Some("dff"),
            FileFormat::Txd => Some("txd"),
            FileFormat::Col1 | FileFormat::Col2 | FileFormat::Col3 | FileFormat::Col4 => {
                Some("col")
            }
            FileFormat::Unknown => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FileFormat::Dff => "DFF - RenderWare 3D Model Format",
            FileFormat::Txd => "TXD - RenderWare Texture Dictionary",
            FileFormat::Col1 => "COL1 (GTA III/VC)",
            FileFormat::Col2 => "COL2 (GTA SA)",
            FileFormat::Col3 => "COL3 (GTA SA Advanced)",
            FileFormat::Col4 => "COL4 (Extended)",
            FileFormat::Unknown => "Unknown format",
        }
    }

    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            FileFormat::Col1 | FileFormat::Col2 | FileFormat::Col3 | FileFormat::Col4
        )
    }

    /// Whether the format belongs to the RenderWare tool chain
    pub fn is_renderware(&self) -> bool {
        *self != FileFormat::Unknown
    }

    /// Format implied by a file extension alone
    pub fn from_extension(extension: &str) -> FileFormat {
        match extension.to_ascii_lowercase().as_str() {
            "dff" => FileFormat::Dff,
            "txd" => FileFormat::Txd,
            "col" => FileFormat::Col1,
            _ => FileFormat::Unknown,
        }
    }
}

impl From<ColVersion> for FileFormat {
    fn from(value: ColVersion) -> Self {
        match value {
            ColVersion::Col1 => FileFormat::Col1,
            ColVersion::Col2 => FileFormat::Col2,
            ColVersion::Col3 => FileFormat::Col3,
            ColVersion::Col4 => FileFormat::Col4,
        }
    }
}

/// What a detection was based on
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Confidence {
    /// The bytes themselves identified the format
    #[display("content")]
    Content,
    /// Nothing in the bytes matched, the filename extension was used
    #[display("filename")]
    Filename,
}

/// Outcome of [`classify`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionResult {
    pub format: FileFormat,
    /// Engine version of the root section, absent for COL files and fallbacks
    pub version: Option<VersionInfo>,
    /// Game the asset was made for, when it can be told
    pub game: Option<GameLabel>,
    pub confidence: Confidence,
}

impl DetectionResult {
    fn from_content(format: FileFormat, version: Option<VersionInfo>, game: Option<GameLabel>) -> Self {
        DetectionResult {
            format,
            version,
            game,
            confidence: Confidence::Content,
        }
    }

    /// Whether the format was detected from the bytes rather than the filename
    pub fn is_confident(&self) -> bool {
        self.confidence == Confidence::Content
    }
}

impl std::fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format)?;
        match (&self.version, self.game) {
            (Some(version), _) => write!(f, " {}", version)?,
            (None, Some(game)) => write!(f, " ({})", game)?,
            (None, None) => {}
        }
        if !self.is_confident() {
            write!(f, " [by extension]")?;
        }
        Ok(())
    }
}

const GTA3_DIRECTORIES: &[&str] = &["gta3", "gtaiii", "gta iii", "grand theft auto iii"];
const VICE_CITY_DIRECTORIES: &[&str] = &[
    "gtavc",
    "gta vc",
    "vicecity",
    "vice city",
    "gta vice city",
    "grand theft auto vice city",
];

/// Game named by the install directory a hint points into
fn game_from_path(hint: &str) -> Option<GameLabel> {
    let mut components = hint.split(['/', '\\']).collect::<Vec<_>>();
    components.pop();

    components.iter().rev().find_map(|component| {
        let component = component.to_ascii_lowercase();
        if GTA3_DIRECTORIES.contains(&component.as_str()) {
            Some(GameLabel::Gta3)
        } else if VICE_CITY_DIRECTORIES.contains(&component.as_str()) {
            Some(GameLabel::ViceCity)
        } else {
            None
        }
    })
}

fn collision_game(version: ColVersion, hint: Option<&str>) -> Option<GameLabel> {
    match version {
        // Both GTA III and Vice City write COLL
        ColVersion::Col1 => hint.and_then(game_from_path),
        ColVersion::Col2 | ColVersion::Col3 => Some(GameLabel::SanAndreas),
        ColVersion::Col4 => None,
    }
}

fn from_filename(hint: Option<&str>) -> DetectionResult {
    let format = hint
        .and_then(|hint| Path::new(hint).extension())
        .and_then(OsStr::to_str)
        .map(FileFormat::from_extension)
        .unwrap_or(FileFormat::Unknown);

    debug!(?hint, %format, "falling back to the filename");

    DetectionResult {
        format,
        version: None,
        game: None,
        confidence: Confidence::Filename,
    }
}

/// Determine the format, engine version and game of an asset.
///
/// Collision FourCCs are checked first, then the RenderWare section tree, and
/// finally the extension of `hint`. Only an empty buffer is an error, anything
/// else yields a result, possibly [`FileFormat::Unknown`].
///
/// ```
/// # fn doit() -> rwkit_rw::error::Result<()>
/// # {
/// use rwkit_rw::{classify, FileFormat};
///
/// let result = classify(b"COL2\x00\x00\x00\x00", None)?;
/// assert_eq!(result.format, FileFormat::Col2);
/// # Ok(())
/// # }
/// # doit().unwrap();
/// ```
#[instrument(skip(data), fields(len = data.len()), err)]
pub fn classify(data: &[u8], hint: Option<&str>) -> Result<DetectionResult> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    if let Some(version) = data.get(..4).and_then(ColVersion::from_fourcc) {
        debug!(%version, "collision signature");
        return Ok(DetectionResult::from_content(
            version.into(),
            None,
            collision_game(version, hint),
        ));
    }

    match walk_chunks(data, DEFAULT_MAX_DEPTH) {
        Ok(root) => {
            let format = match root.kind() {
                ChunkType::CLUMP => Some(FileFormat::Dff),
                ChunkType::TEX_DICTIONARY => Some(FileFormat::Txd),
                _ => None,
            };

            if let Some(format) = format {
                let version = root.header.version();
                debug!(%format, %version, status = ?root.status, "renderware root section");
                return Ok(DetectionResult::from_content(
                    format,
                    Some(version),
                    Some(version.game),
                ));
            }

            debug!(kind = %root.kind(), "root section is not a clump or texture dictionary");
        }
        Err(err) => debug!(%err, "no renderware section tree"),
    }

    Ok(from_filename(hint))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::chunk::ChunkType;
    use crate::col::test::col_model;
    use crate::detect::{classify, Confidence, FileFormat};
    use crate::error::{Error, Result};
    use crate::tree::test::chunk;
    use crate::tree::walk_chunks;
    use crate::version::GameLabel;

    fn synthetic_dff(library_id: u32) -> Vec<u8> {
        chunk(
            ChunkType::CLUMP,
            library_id,
            &chunk(ChunkType::STRUCT, library_id, &[0; 12]),
        )
    }

    #[traced_test]
    #[test]
    fn classify_dff() -> Result<()> {
        let data = synthetic_dff(0x36003);

        let root = walk_chunks(&data, 8)?;
        assert_eq!(root.children.len(), 1);

        let result = classify(&data, None)?;
        assert_eq!(result.format, FileFormat::Dff);
        assert_eq!(result.confidence, Confidence::Content);
        let version = result.version.expect("version");
        assert_eq!(version.version_string(), "3.6.0.3");
        assert_eq!(version.game, GameLabel::SanAndreas);
        assert_eq!(result.game, Some(GameLabel::SanAndreas));

        Ok(())
    }

    #[test]
    fn classify_txd() -> Result<()> {
        let data = chunk(
            ChunkType::TEX_DICTIONARY,
            0x0C02FFFF,
            &chunk(ChunkType::STRUCT, 0x0C02FFFF, &[1, 0, 0, 0]),
        );

        let result = classify(&data, Some("vehicle.txd"))?;

        assert_eq!(result.format, FileFormat::Txd);
        assert_eq!(result.game, Some(GameLabel::ViceCity));
        assert!(result.is_confident());
        assert_eq!(result.to_string(), "TXD 3.3.0.2 (Vice City)");

        Ok(())
    }

    #[test]
    fn classify_truncated_dff_prefix() -> Result<()> {
        // Archives are sometimes only sampled for their first bytes
        let data = synthetic_dff(0x31001);

        let result = classify(&data[..20], None)?;

        assert_eq!(result.format, FileFormat::Dff);
        assert_eq!(result.game, Some(GameLabel::Gta3));

        Ok(())
    }

    #[test]
    fn col2_ignores_payload() -> Result<()> {
        let mut data = b"COL2".to_vec();
        data.extend_from_slice(&[0; 60]);

        let result = classify(&data, Some("model.dff"))?;

        assert_eq!(result.format, FileFormat::Col2);
        assert_eq!(result.version, None);
        assert_eq!(result.game, Some(GameLabel::SanAndreas));
        assert!(result.is_confident());

        assert_eq!(classify(b"COL2", None)?.format, FileFormat::Col2);

        Ok(())
    }

    #[test]
    fn col1_game_needs_hint() -> Result<()> {
        let data = col_model(b"COLL", "bridge", 0, &[0; 8]);

        let result = classify(&data, None)?;
        assert_eq!(result.format, FileFormat::Col1);
        assert_eq!(result.game, None);

        let result = classify(&data, Some("generic.col"))?;
        assert_eq!(result.game, None);

        let result = classify(&data, Some("C:\\Games\\GTAVC\\models\\coll\\generic.col"))?;
        assert_eq!(result.game, Some(GameLabel::ViceCity));

        let result = classify(&data, Some("/games/gta3/models/coll/generic.col"))?;
        assert_eq!(result.game, Some(GameLabel::Gta3));

        Ok(())
    }

    #[test]
    fn col3_and_col4() -> Result<()> {
        let result = classify(&col_model(b"COL3", "a", 0, &[]), None)?;
        assert_eq!(result.format, FileFormat::Col3);
        assert_eq!(result.game, Some(GameLabel::SanAndreas));

        let result = classify(&col_model(b"COL4", "a", 0, &[]), None)?;
        assert_eq!(result.format, FileFormat::Col4);
        assert_eq!(result.game, None);

        Ok(())
    }

    #[test]
    fn short_buffer_falls_back_to_filename() -> Result<()> {
        let data = [0x10, 0x00, 0x00, 0x00, 0x20];

        assert!(matches!(
            walk_chunks(&data, 8),
            Err(Error::TruncatedHeader { .. })
        ));

        let result = classify(&data, Some("player.DFF"))?;
        assert_eq!(result.format, FileFormat::Dff);
        assert_eq!(result.version, None);
        assert_eq!(result.confidence, Confidence::Filename);
        assert!(!result.is_confident());

        let result = classify(&data, Some("map.col"))?;
        assert_eq!(result.format, FileFormat::Col1);
        assert_eq!(result.confidence, Confidence::Filename);

        let result = classify(&data, None)?;
        assert_eq!(result.format, FileFormat::Unknown);

        Ok(())
    }

    #[test]
    fn unrecognized_root_section() -> Result<()> {
        let data = chunk(ChunkType::WORLD, 0x36003, &[]);

        assert_eq!(classify(&data, None)?.format, FileFormat::Unknown);
        assert_eq!(
            classify(&data, Some("landscape.txd"))?.format,
            FileFormat::Txd
        );
        assert_eq!(
            classify(&data, Some("readme.txt"))?.format,
            FileFormat::Unknown
        );

        Ok(())
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(classify(&[], None), Err(Error::EmptyInput)));
        assert!(matches!(
            classify(&[], Some("model.dff")),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn classify_is_deterministic() -> Result<()> {
        for data in [
            synthetic_dff(0x35002),
            b"COLL".to_vec(),
            vec![0xAB; 7],
            vec![0x16, 0, 0, 0, 0xFF, 0xFF, 0, 0, 0, 0, 0, 0],
        ] {
            assert_eq!(classify(&data, Some("x.txd"))?, classify(&data, Some("x.txd"))?);
        }

        Ok(())
    }

    #[test]
    fn format_metadata() {
        assert_eq!(FileFormat::Dff.extension(), Some("dff"));
        assert_eq!(FileFormat::Col3.extension(), Some("col"));
        assert_eq!(FileFormat::Unknown.extension(), None);
        assert_eq!(FileFormat::Txd.description(), "TXD - RenderWare Texture Dictionary");
        assert!(FileFormat::Col4.is_collision());
        assert!(!FileFormat::Dff.is_collision());
        assert!(!FileFormat::Unknown.is_renderware());
    }
}
