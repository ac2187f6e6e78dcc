//! Base types for structure of IMG files.

use binrw::BinRead;

/// Size of a sector, offsets and sizes in the directory are counted in sectors
pub const SECTOR_SIZE: u64 = 2048;

/// Size of a directory entry, for both versions
pub const RECORD_SIZE: usize = 32;

/// Version 2 header
///
/// Version 2 archives keep their directory at the start of the `.img` file, which always
/// starts with "VER2". All data is stored in little endian format
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"VER2", little)]
pub struct ImgHeader {
    /// The number of directory entries following the header
    pub entries: u32,
}

/// Version 2 directory entry
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq)]
#[br(little)]
pub struct ImgRecord {
    /// Sector the entry data starts at
    pub offset: u32,

    /// Size of the entry in sectors as used for streaming
    pub streaming_size: u16,

    /// Size of the entry in sectors inside the archive, zero when equal to the streaming size
    pub archive_size: u16,

    /// NUL padded name
    pub name: [u8; 24],
}
