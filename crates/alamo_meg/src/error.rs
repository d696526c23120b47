//! Error types that can be emitted from this library

use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::checksum::Checksum;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] io::Error),

    /// Transparent warpper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// invalid argument: {0}
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// invalid operation: {0}
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// file is a corrupted meg archive
    #[error("file is a corrupted meg archive")]
    #[diagnostic(help("the archive was probably hand-edited or is not a meg archive"))]
    Corruption(#[from] CorruptionError),

    /// {what} of {value} exceeds the supported range
    #[error("{what} of {value} exceeds the supported range")]
    UnsupportedRange {
        /// The quantity that is out of range
        what: &'static str,
        /// The offending value
        value: u64,
    },

    /// index {index} is out of range for a table of {len} elements
    #[error("index {index} is out of range for a table of {len} elements")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of elements in the table
        len: usize,
    },

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type describing which structural invariant of an archive was violated
#[derive(Error, Diagnostic, Debug, PartialEq)]
pub enum CorruptionError {
    /// the stream ended before the metadata was complete
    #[error("the stream ended before the metadata was complete")]
    Truncated,

    /// header declares {names} names but {files} files
    #[error("header declares {names} names but {files} files")]
    CountMismatch {
        /// Declared name count
        names: u32,
        /// Declared file count
        files: u32,
    },

    /// descriptor at index {index} claims table position {found}
    #[error("descriptor at index {index} claims table position {found}")]
    TablePosition {
        /// Actual position in the file table
        index: usize,
        /// Position stored in the descriptor
        found: u32,
    },

    /// checksum {current} at index {index} is smaller than its predecessor {previous}
    #[error("checksum {current} at index {index} is smaller than its predecessor {previous}")]
    ChecksumOrder {
        /// Position of the offending descriptor
        index: usize,
        /// Checksum of the preceding descriptor
        previous: Checksum,
        /// Checksum of the offending descriptor
        current: Checksum,
    },

    /// descriptor at index {index} refers to name {name_index} of {len}
    #[error("descriptor at index {index} refers to name {name_index} of {len}")]
    NameIndex {
        /// Position of the offending descriptor
        index: usize,
        /// Name index stored in the descriptor
        name_index: u32,
        /// Number of names in the name table
        len: usize,
    },

    /// metadata occupies {actual} bytes but {expected} were declared
    #[error("metadata occupies {actual} bytes but {expected} were declared")]
    MetadataSize {
        /// Size computed from the decoded metadata
        expected: u64,
        /// Bytes consumed while decoding
        actual: u64,
    },

    /// data of descriptor {index} starts at {found} instead of {expected}
    #[error("data of descriptor {index} starts at {found} instead of {expected}")]
    DataOffset {
        /// Position of the offending descriptor
        index: usize,
        /// Offset right after the metadata or the preceding entry's data
        expected: u64,
        /// Offset stored in the descriptor
        found: u32,
    },

    /// archive is {actual} bytes long but {expected} bytes were expected
    #[error("archive is {actual} bytes long but {expected} bytes were expected")]
    ArchiveSize {
        /// Metadata size plus the sum of all file sizes
        expected: u64,
        /// Length of the archive stream
        actual: u64,
    },

    /// source for {path} ended after {actual} of {expected} bytes
    #[error("source for {path} ended after {actual} of {expected} bytes")]
    SourceTruncated {
        /// Archive path of the entry being written
        path: String,
        /// Recorded size of the source
        expected: u64,
        /// Bytes actually copied
        actual: u64,
    },
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by path {0}
    #[error("by path {0}")]
    Path(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

/// Maps an I/O error raised while decoding metadata, reporting a short read as truncation.
pub(crate) fn truncation(error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        CorruptionError::Truncated.into()
    } else {
        error.into()
    }
}

/// Same as [`truncation`] for errors surfaced by [`binrw`].
pub(crate) fn binrw_truncation(error: binrw::Error) -> Error {
    if error.is_eof() {
        CorruptionError::Truncated.into()
    } else {
        error.into()
    }
}
