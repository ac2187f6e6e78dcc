//! This library detects and walks the **RenderWare** binary assets used by the 3D-era *Grand Theft Auto* games.
//!
//! # RenderWare Binary Stream Documentation
//!
//! DFF models and TXD texture dictionaries are RenderWare binary streams: a tree of sections, each
//! starting with the same fixed header. COL collision files are not streams and are identified by a
//! FourCC instead, see [`col`].
//!
//! ## Section Header
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Type                   | 4 bytes: Section identifier, e.g. 0x10 for a clump         |
//! | 0x0004         | Size                   | 4 bytes: Size of the section data following the header    |
//! | 0x0008         | Library Id             | 4 bytes: Packed version of the library that wrote it       |
//!
//! - **Type**: Identifies what the section holds. Some sections (clumps, frame lists, geometries,
//!   extensions, ...) hold nothing but further sections, others (structs, strings, plugin data)
//!   hold raw data.
//! - **Size**: Number of bytes following the header that belong to the section, nested sections
//!   included.
//! - **Library Id**: The RenderWare version and build, see [`version`] for the encodings.
//!
//! ## Root Sections
//!
//! The type of the first section tells the file kind:
//!
//! - `0x0010` **Clump**: a DFF model
//! - `0x0016` **Texture Dictionary**: a TXD texture dictionary
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.dff`, `.txd`, `.col`
//! - **Endianness**: Little-endian for all multi-byte integers
//!

pub mod analyze;
pub mod chunk;
pub mod col;
pub mod detect;
pub mod error;
pub mod tree;
pub mod version;

pub use analyze::{analyze_archive, ArchiveAnalyzer, ArchiveSummary};
pub use chunk::{ChunkHeader, ChunkType};
pub use detect::{classify, Confidence, DetectionResult, FileFormat};
pub use tree::{walk_chunks, ChunkNode, ChunkWalker, NodeStatus, WalkOptions};
pub use version::{decode_version, GameLabel, VersionInfo};

#[cfg(feature = "rayon")]
pub use analyze::analyze_archive_par;
