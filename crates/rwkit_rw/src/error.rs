//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// fewer than 12 bytes remain where a section header was expected
    #[error("truncated section header at offset {offset:#x} ({available} bytes available)")]
    #[diagnostic(help("a RenderWare section header is 12 bytes: type, size and library id"))]
    TruncatedHeader {
        /// Offset the header was expected at
        offset: usize,
        /// Bytes left in the buffer from that offset
        available: usize,
    },

    /// the buffer handed over for analysis was empty
    #[error("nothing to analyze, the buffer is empty")]
    EmptyInput,

    /// {0} is not a dotted RenderWare version
    #[error("{0} is not a dotted RenderWare version")]
    InvalidVersionString(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
