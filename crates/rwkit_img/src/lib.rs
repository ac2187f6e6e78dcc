//! This library handles reading **IMG** archives used by the 3D-era *Grand Theft Auto* games.
//!
//! # IMG Archive Format Documentation
//!
//! IMG archives bundle the streamed models, texture dictionaries and collision files of the game.
//! Everything in the archive is aligned to sectors of 2048 bytes, offsets and sizes in the
//! directory are counted in sectors. Two layouts exist.
//!
//! ## Version 1 (GTA III & VC)
//!
//! The directory is kept in a separate `.dir` file next to the `.img` file. The `.dir` file is
//! nothing but a list of entries:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Offset                 | 4 bytes: Sector the entry data starts at                   |
//! | 0x0004         | Size                   | 4 bytes: Size of the entry data in sectors                 |
//! | 0x0008         | Name                   | 24 bytes: NUL padded file name                             |
//!
//! ## Version 2 (GTA SA)
//!
//! The directory is kept at the start of the `.img` file itself:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "VER2"                                            |
//! | 0x0004         | Entry Count            | 4 bytes: Number of directory entries                       |
//! | 0x0008         | Entries                | 32 bytes per entry                                         |
//!
//! Each entry has the following structure:
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Offset                 | 4 bytes: Sector the entry data starts at                   |
//! | 0x0004         | Streaming Size         | 2 bytes: Size in sectors used when streaming               |
//! | 0x0006         | Archive Size           | 2 bytes: Size in sectors in the archive, usually zero      |
//! | 0x0008         | Name                   | 24 bytes: NUL padded file name                             |
//!
//! - **Archive Size**: When zero the streaming size is the size of the entry.
//!
//! ## Additional Information
//!
//! - **File Extensions**: `.img`, `.dir`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Names**: Matched ignoring ASCII case
//!

pub mod error;
pub mod read;
pub mod types;

pub use read::{ImgArchive, ImgVersion};
