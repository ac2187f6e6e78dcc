//! Collision files.
//!
//! COL files do not use RenderWare sections. A file is a sequence of models,
//! each starting with a FourCC naming its generation:
//!
//! | Offset | Field    | Description                                      |
//! |--------|----------|--------------------------------------------------|
//! | 0x00   | FourCC   | 4 bytes: `COLL`, `COL2`, `COL3` or `COL4`        |
//! | 0x04   | Size     | 4 bytes: size of the model after this field      |
//! | 0x08   | Name     | 22 bytes: NUL padded model name                  |
//! | 0x1E   | Model id | 2 bytes: model identifier                        |

use std::io::Cursor;

use binrw::BinRead;
use derive_more::Display;
use tracing::{debug, instrument};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Size of the fixed part of every model header
pub const COL_HEADER_SIZE: usize = 32;

/// Generation of a collision model
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColVersion {
    #[display("COL1")]
    Col1,
    #[display("COL2")]
    Col2,
    #[display("COL3")]
    Col3,
    #[display("COL4")]
    Col4,
}

impl ColVersion {
    /// Match the FourCC a model starts with
    pub fn from_fourcc(fourcc: &[u8]) -> Option<ColVersion> {
        match fourcc {
            b"COLL" => Some(ColVersion::Col1),
            b"COL2" => Some(ColVersion::Col2),
            b"COL3" => Some(ColVersion::Col3),
            b"COL4" => Some(ColVersion::Col4),
            _ => None,
        }
    }

    pub fn fourcc(&self) -> &'static [u8; 4] {
        match self {
            ColVersion::Col1 => b"COLL",
            ColVersion::Col2 => b"COL2",
            ColVersion::Col3 => b"COL3",
            ColVersion::Col4 => b"COL4",
        }
    }
}

#[derive(BinRead, Debug)]
#[br(little)]
struct RawColHeader {
    fourcc: [u8; 4],
    size: u32,
    name: [u8; 22],
    model_id: u16,
}

/// Header of one model inside a COL file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColModelHeader {
    pub version: ColVersion,
    /// Offset of the FourCC in the file
    pub offset: usize,
    /// Size of the model after the size field
    pub size: u32,
    pub name: String,
    pub model_id: u16,
}

impl ColModelHeader {
    /// Offset one past the last byte of this model
    pub fn end(&self) -> usize {
        (self.offset + 8).saturating_add(self.size as usize)
    }
}

/// List the models stored in a COL file.
///
/// Reading stops at the first header that is too short or does not start with
/// a known FourCC, which covers the zero padding archives leave after the data.
#[instrument(skip(data), fields(len = data.len()), err)]
pub fn read_col_models(data: &[u8]) -> Result<Vec<ColModelHeader>> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut models = Vec::new();
    let mut offset = 0;
    while data.len().saturating_sub(offset) >= COL_HEADER_SIZE {
        let raw = RawColHeader::read(&mut Cursor::new(&data[offset..]))?;
        let Some(version) = ColVersion::from_fourcc(&raw.fourcc) else {
            debug!(offset, "no further collision models");
            break;
        };

        let name_len = raw.name.iter().position(|c| *c == 0).unwrap_or(raw.name.len());
        let model = ColModelHeader {
            version,
            offset,
            size: raw.size,
            name: String::from_utf8_lossy(&raw.name[..name_len]).into_owned(),
            model_id: raw.model_id,
        };

        offset = model.end();
        models.push(model);
    }

    Ok(models)
}
