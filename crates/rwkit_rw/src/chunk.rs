//! Section headers of a RenderWare binary stream.

use std::fmt;

use tracing::trace;
use winnow::binary::le_u32;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::VersionInfo;

/// Size in bytes of every section header: type, size and library id.
pub const HEADER_SIZE: usize = 12;

/// Identifier of a RenderWare section.
///
/// Unknown identifiers are kept as-is, the type never rejects a value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ChunkType(pub u32);

impl ChunkType {
    pub const STRUCT: ChunkType = ChunkType(0x0001);
    pub const STRING: ChunkType = ChunkType(0x0002);
    pub const EXTENSION: ChunkType = ChunkType(0x0003);
    pub const CAMERA: ChunkType = ChunkType(0x0005);
    pub const TEXTURE: ChunkType = ChunkType(0x0006);
    pub const MATERIAL: ChunkType = ChunkType(0x0007);
    pub const MATERIAL_LIST: ChunkType = ChunkType(0x0008);
    pub const ATOMIC_SECTION: ChunkType = ChunkType(0x0009);
    pub const PLANE_SECTION: ChunkType = ChunkType(0x000A);
    pub const WORLD: ChunkType = ChunkType(0x000B);
    pub const FRAME_LIST: ChunkType = ChunkType(0x000E);
    pub const GEOMETRY: ChunkType = ChunkType(0x000F);
    pub const CLUMP: ChunkType = ChunkType(0x0010);
    pub const LIGHT: ChunkType = ChunkType(0x0012);
    pub const UNICODE_STRING: ChunkType = ChunkType(0x0013);
    pub const ATOMIC: ChunkType = ChunkType(0x0014);
    pub const TEXTURE_NATIVE: ChunkType = ChunkType(0x0015);
    pub const TEX_DICTIONARY: ChunkType = ChunkType(0x0016);
    pub const ANIM_DATABASE: ChunkType = ChunkType(0x0017);
    pub const IMAGE: ChunkType = ChunkType(0x0018);
    pub const GEOMETRY_LIST: ChunkType = ChunkType(0x001A);
    pub const PI_TEX_DICTIONARY: ChunkType = ChunkType(0x0023);

    // Toolkit plugins
    pub const SKIN_PLUGIN: ChunkType = ChunkType(0x0116);
    pub const HANIM_PLUGIN: ChunkType = ChunkType(0x011E);
    pub const MATERIAL_EFFECTS_PLUGIN: ChunkType = ChunkType(0x0120);
    pub const BIN_MESH_PLUGIN: ChunkType = ChunkType(0x050E);
    pub const NATIVE_DATA_PLUGIN: ChunkType = ChunkType(0x0510);

    // Rockstar plugins
    pub const PIPELINE_SET: ChunkType = ChunkType(0x0253_F2F3);
    pub const SPECULAR_MATERIAL: ChunkType = ChunkType(0x0253_F2F6);
    pub const EFFECT_2D: ChunkType = ChunkType(0x0253_F2F8);
    pub const NIGHT_VERTEX_COLORS: ChunkType = ChunkType(0x0253_F2F9);
    pub const COLLISION_MODEL: ChunkType = ChunkType(0x0253_F2FA);
    pub const REFLECTION_MATERIAL: ChunkType = ChunkType(0x0253_F2FC);
    pub const MESH_EXTENSION: ChunkType = ChunkType(0x0253_F2FD);
    pub const NODE_NAME: ChunkType = ChunkType(0x0253_F2FE);

    const NAMES: &'static [(ChunkType, &'static str)] = &[
        (Self::STRUCT, "Struct"),
        (Self::STRING, "String"),
        (Self::EXTENSION, "Extension"),
        (Self::CAMERA, "Camera"),
        (Self::TEXTURE, "Texture"),
        (Self::MATERIAL, "Material"),
        (Self::MATERIAL_LIST, "Material List"),
        (Self::ATOMIC_SECTION, "Atomic Section"),
        (Self::PLANE_SECTION, "Plane Section"),
        (Self::WORLD, "World"),
        (Self::FRAME_LIST, "Frame List"),
        (Self::GEOMETRY, "Geometry"),
        (Self::CLUMP, "Clump"),
        (Self::LIGHT, "Light"),
        (Self::UNICODE_STRING, "Unicode String"),
        (Self::ATOMIC, "Atomic"),
        (Self::TEXTURE_NATIVE, "Texture Native"),
        (Self::TEX_DICTIONARY, "Texture Dictionary"),
        (Self::ANIM_DATABASE, "Animation Database"),
        (Self::IMAGE, "Image"),
        (Self::GEOMETRY_LIST, "Geometry List"),
        (Self::PI_TEX_DICTIONARY, "PI Texture Dictionary"),
        (Self::SKIN_PLUGIN, "Skin PLG"),
        (Self::HANIM_PLUGIN, "HAnim PLG"),
        (Self::MATERIAL_EFFECTS_PLUGIN, "Material Effects PLG"),
        (Self::BIN_MESH_PLUGIN, "Bin Mesh PLG"),
        (Self::NATIVE_DATA_PLUGIN, "Native Data PLG"),
        (Self::PIPELINE_SET, "Pipeline Set"),
        (Self::SPECULAR_MATERIAL, "Specular Material"),
        (Self::EFFECT_2D, "2d Effect"),
        (Self::NIGHT_VERTEX_COLORS, "Night Vertex Colors"),
        (Self::COLLISION_MODEL, "Collision Model"),
        (Self::REFLECTION_MATERIAL, "Reflection Material"),
        (Self::MESH_EXTENSION, "Mesh Extension"),
        (Self::NODE_NAME, "Node Name"),
    ];

    /// Display name of a known section type
    pub fn name(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
    }

    /// Whether the data of this section is a sequence of nested sections
    pub fn is_container(&self) -> bool {
        matches!(
            *self,
            Self::EXTENSION
                | Self::CAMERA
                | Self::TEXTURE
                | Self::MATERIAL
                | Self::MATERIAL_LIST
                | Self::ATOMIC_SECTION
                | Self::PLANE_SECTION
                | Self::WORLD
                | Self::FRAME_LIST
                | Self::GEOMETRY
                | Self::CLUMP
                | Self::LIGHT
                | Self::ATOMIC
                | Self::TEXTURE_NATIVE
                | Self::TEX_DICTIONARY
                | Self::GEOMETRY_LIST
        )
    }
}

impl From<u32> for ChunkType {
    fn from(value: u32) -> Self {
        ChunkType(value)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Unknown({:#X})", self.0),
        }
    }
}

/// Header of a single section
///
/// | Offset | Field      | Description                                  |
/// |--------|------------|----------------------------------------------|
/// | 0x00   | Type       | 4 bytes: section identifier                  |
/// | 0x04   | Size       | 4 bytes: size of the data following the header |
/// | 0x08   | Library id | 4 bytes: packed RenderWare version           |
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChunkHeader {
    /// Section identifier
    pub kind: ChunkType,
    /// Size of the section data, excluding this header
    pub size: u32,
    /// Packed library version word
    pub library_id: u32,
    /// Absolute offset of the header in the buffer
    pub offset: usize,
}

fn parse_header(input: &mut &[u8]) -> core::result::Result<(u32, u32, u32), ErrMode<ContextError>> {
    (le_u32, le_u32, le_u32).parse_next(input)
}

impl ChunkHeader {
    /// Read the header starting at `offset`.
    pub fn read(data: &[u8], offset: usize) -> Result<ChunkHeader> {
        let available = data.len().saturating_sub(offset);
        let truncated = || Error::TruncatedHeader { offset, available };

        if available < HEADER_SIZE {
            return Err(truncated());
        }

        let mut input = &data[offset..offset + HEADER_SIZE];
        let (kind, size, library_id) = parse_header(&mut input).map_err(|_| truncated())?;

        let header = ChunkHeader {
            kind: ChunkType(kind),
            size,
            library_id,
            offset,
        };
        trace!(?header, "read section header");

        Ok(header)
    }

    /// Offset of the first byte after the header
    pub fn data_start(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    /// Offset one past the last byte the header claims for its data
    pub fn data_end(&self) -> usize {
        self.data_start().saturating_add(self.size as usize)
    }

    /// Decoded form of the library id
    pub fn version(&self) -> VersionInfo {
        VersionInfo::from(self.library_id)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::chunk::{ChunkHeader, ChunkType};
    use crate::error::{Error, Result};

    #[test]
    fn read_header_minimum() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x10, 0x00, 0x00, 0x00, // Type
            0x00, 0x00, 0x00, 0x00, // Size
            0xFF, 0xFF, 0x03, 0x18, // Library id
        ];

        let header = ChunkHeader::read(&input, 0)?;

        assert_eq!(
            header,
            ChunkHeader {
                kind: ChunkType::CLUMP,
                size: 0,
                library_id: 0x1803FFFF,
                offset: 0,
            }
        );
        assert_eq!(header.data_start(), 12);
        assert_eq!(header.data_end(), 12);

        Ok(())
    }

    #[test]
    fn read_header_at_offset() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0xAA, 0xBB,
            0x16, 0x00, 0x00, 0x00,
            0x20, 0x01, 0x00, 0x00,
            0x03, 0x60, 0x03, 0x00,
        ];

        let header = ChunkHeader::read(&input, 2)?;

        assert_eq!(header.kind, ChunkType::TEX_DICTIONARY);
        assert_eq!(header.size, 0x120);
        assert_eq!(header.library_id, 0x36003);
        assert_eq!(header.offset, 2);
        assert_eq!(header.data_end(), 14 + 0x120);

        Ok(())
    }

    #[test]
    fn read_header_truncated() {
        let input = [0x10, 0x00, 0x00, 0x00, 0x00];

        let result = ChunkHeader::read(&input, 0);
        assert!(matches!(
            result,
            Err(Error::TruncatedHeader {
                offset: 0,
                available: 5
            })
        ));
    }

    #[test]
    fn read_header_past_end() {
        let input = [0u8; 12];

        let result = ChunkHeader::read(&input, 20);
        assert!(matches!(
            result,
            Err(Error::TruncatedHeader {
                offset: 20,
                available: 0
            })
        ));
    }

    #[test]
    fn chunk_type_names() {
        assert_eq!(ChunkType::CLUMP.to_string(), "Clump");
        assert_eq!(ChunkType::NODE_NAME.to_string(), "Node Name");
        assert_eq!(ChunkType(0xDEAD).to_string(), "Unknown(0xDEAD)");
        assert!(ChunkType::GEOMETRY_LIST.is_container());
        assert!(!ChunkType::STRUCT.is_container());
        assert!(!ChunkType(0xDEAD).is_container());
    }
}
