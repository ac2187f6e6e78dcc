//! Types for reading IMG archives
//!

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use derive_more::Display;
use indexmap::IndexMap;
use std::{
    fmt::{self, Debug},
    io::{Read, Seek, SeekFrom, Take},
    sync::Arc,
};
use tracing::{debug, warn};

use crate::{
    error::{Error, FileNotFoundError, Result},
    types::{ImgHeader, ImgRecord, RECORD_SIZE, SECTOR_SIZE},
};

/// Layout of an IMG archive
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ImgVersion {
    /// Directory kept in a separate `.dir` file
    #[display("Version 1 (GTA III & VC)")]
    V1,

    /// Directory kept at the start of the `.img` file
    #[display("Version 2 (GTA SA)")]
    V2,
}

/// Structure representing an IMG directory entry.
#[derive(Debug, Clone, Default)]
pub struct ImgEntryData {
    /// Name of the file
    pub file_name: Box<str>,
    /// Raw file name, without the NUL padding
    pub file_name_raw: Box<[u8]>,
    /// Sector the data starts at
    pub offset: u32,
    /// Size of the data in sectors
    pub sectors: u32,
}

impl ImgEntryData {
    /// Starting offset of the data, in bytes
    pub fn data_start(&self) -> u64 {
        self.offset as u64 * SECTOR_SIZE
    }

    /// Size of the data, in bytes, including the padding of the last sector
    pub fn size(&self) -> u64 {
        self.sectors as u64 * SECTOR_SIZE
    }

    fn new(offset: u32, sectors: u32, name: &[u8]) -> Self {
        let end = name.iter().position(|c| *c == 0).unwrap_or(name.len());
        let raw = &name[..end];

        ImgEntryData {
            file_name: String::from_utf8_lossy(raw).into(),
            file_name_raw: raw.into(),
            offset,
            sectors,
        }
    }
}

/// A struct for reading an entry from an IMG file
pub struct ImgFile<'a, R: Read + Seek> {
    data: &'a ImgEntryData,
    reader: Take<&'a mut R>,
}

impl<R: Read + Seek> Debug for ImgFile<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImgFile({:#?})", self.data)
    }
}

impl<R: Read + Seek> ImgFile<'_, R> {
    /// Get the name of the file
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this name directly when extracting an archive.
    /// It may contain an absolute path or break out of the current directory.
    pub fn name(&self) -> &str {
        &self.data.file_name
    }

    /// Get the name of the file, in the raw (internal) byte representation.
    pub fn name_raw(&self) -> &[u8] {
        &self.data.file_name_raw
    }

    /// Get the size of the file, in bytes, as recorded in the directory
    pub fn size(&self) -> u64 {
        self.data.size()
    }

    /// Get the starting offset of the data of the file
    pub fn data_start(&self) -> u64 {
        self.data.data_start()
    }
}

impl<R: Read + Seek> Read for ImgFile<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

#[derive(Debug)]
pub(crate) struct Shared {
    version: ImgVersion,
    files: Vec<ImgEntryData>,
    names: IndexMap<Box<str>, usize>,
}

impl Shared {
    fn new(version: ImgVersion, files: Vec<ImgEntryData>) -> Self {
        let mut names = IndexMap::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let key: Box<str> = file.file_name.to_ascii_lowercase().into();
            if names.contains_key(&key) {
                debug!(name = %file.file_name, index, "duplicate entry name");
                continue;
            }
            names.insert(key, index);
        }

        Shared {
            version,
            files,
            names,
        }
    }
}

/// IMG archive reader
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_img_contents(reader: impl Read + Seek) -> rwkit_img::error::Result<()> {
///     let mut img = rwkit_img::ImgArchive::new(reader)?;
///
///     for i in 0..img.len() {
///         let file = img.by_index(i)?;
///         println!("Filename: {} ({} bytes)", file.name(), file.size());
///     }
///
///     Ok(())
/// }
/// ```
pub struct ImgArchive<R> {
    reader: R,
    shared: Arc<Shared>,
}

impl<R> ImgArchive<R> {
    /// Layout of the archive
    pub fn version(&self) -> ImgVersion {
        self.shared.version
    }

    /// Number of entries contained in this IMG.
    pub fn len(&self) -> usize {
        self.shared.files.len()
    }

    /// Whether this IMG archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator over all the file names in this archive, in directory order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.shared.files.iter().map(|f| f.file_name.as_ref())
    }

    /// Returns an iterator over all directory entries
    pub fn entries(&self) -> impl Iterator<Item = &ImgEntryData> {
        self.shared.files.iter()
    }

    /// Get a directory entry by index
    pub fn entry(&self, index: usize) -> Option<&ImgEntryData> {
        self.shared.files.get(index)
    }

    /// Get the index of a file entry by name, if it's present.
    ///
    /// Names are matched ignoring ASCII case, the first entry wins when a name repeats.
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.shared
            .names
            .get(name.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Get the name of a file entry, if it's present.
    #[inline(always)]
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.entry(index).map(|f| f.file_name.as_ref())
    }

    /// Total size, in bytes, of the data referenced by the directory
    pub fn total_size(&self) -> u64 {
        self.shared.files.iter().map(ImgEntryData::size).sum()
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> ImgArchive<R> {
    /// Read a version 2 IMG archive collecting the files it contains.
    pub fn new(mut reader: R) -> Result<ImgArchive<R>> {
        let header = ImgHeader::read(&mut reader).map_err(|_| Error::InvalidArchive)?;

        let files = (0..header.entries)
            .map(|_| {
                let record = ImgRecord::read(&mut reader)?;
                let sectors = match record.archive_size {
                    0 => record.streaming_size,
                    size => size,
                };
                Ok(ImgEntryData::new(record.offset, sectors as u32, &record.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ImgArchive {
            reader,
            shared: Shared::new(ImgVersion::V2, files).into(),
        })
    }

    /// Read a version 1 IMG archive whose directory lives in a separate `.dir` file.
    ///
    /// A trailing partial record in the directory is ignored.
    pub fn with_directory(mut directory: impl Read, reader: R) -> Result<ImgArchive<R>> {
        let mut raw = Vec::new();
        directory.read_to_end(&mut raw)?;

        let records = raw.chunks_exact(RECORD_SIZE);
        if !records.remainder().is_empty() {
            warn!(
                trailing = records.remainder().len(),
                "directory ends with a partial record"
            );
        }

        let files = records
            .map(|mut record| {
                let offset = record.read_u32::<LittleEndian>()?;
                let sectors = record.read_u32::<LittleEndian>()?;
                Ok(ImgEntryData::new(offset, sectors, record))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ImgArchive {
            reader,
            shared: Shared::new(ImgVersion::V1, files).into(),
        })
    }

    /// Search for a file entry by name
    pub fn by_name(&mut self, name: &str) -> Result<ImgFile<'_, R>> {
        let Some(index) = self.index_for_name(name) else {
            return Err(Error::FileNotFound(FileNotFoundError::Name(
                name.to_owned(),
            )));
        };
        self.by_index(index)
    }

    /// Get a contained file by index
    ///
    /// Reading stops at the end of the underlying archive when the directory claims more data
    /// than the archive holds.
    pub fn by_index(&mut self, file_number: usize) -> Result<ImgFile<'_, R>> {
        let data = self
            .shared
            .files
            .get(file_number)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(file_number)))?;

        self.reader.seek(SeekFrom::Start(data.data_start()))?;

        Ok(ImgFile {
            data,
            reader: (&mut self.reader).take(data.size()),
        })
    }

    /// Read the whole data of a contained file by index
    ///
    /// The buffer grows with what the archive actually holds, the size claimed by the
    /// directory only bounds the read.
    pub fn read_entry(&mut self, file_number: usize) -> Result<Vec<u8>> {
        let mut file = self.by_index(file_number)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;

        if (buffer.len() as u64) < file.size() {
            debug!(
                name = file.name(),
                expected = file.size(),
                actual = buffer.len(),
                "entry runs past the end of the archive"
            );
        }

        Ok(buffer)
    }
}
