//! Structural checks run on decoded metadata before it is trusted.
//!
//! Validators only report problems. Nothing here ever reorders or repairs a table.

use tracing::warn;

use crate::binary::{BinaryElement, BinaryTable};
use crate::error::{CorruptionError, Result};
use crate::read::DecodedMetadata;
use crate::types::{ArchiveMetadata, FileDescriptor};

/// A pass/fail check of an archive invariant
pub trait Validator {
    /// Returns the first violated invariant, if any
    fn validate(&self) -> Result<()>;

    /// Whether every invariant holds
    fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("validation failed: {e}");
                false
            }
        }
    }
}

/// Checks that every descriptor sits at the position it claims and that checksums never decrease
#[derive(Debug, Clone, Copy)]
pub struct StructuralValidator<'a> {
    files: &'a BinaryTable<FileDescriptor>,
}

impl<'a> StructuralValidator<'a> {
    /// Creates a validator for `files`
    pub fn new(files: &'a BinaryTable<FileDescriptor>) -> Self {
        StructuralValidator { files }
    }
}

impl Validator for StructuralValidator<'_> {
    fn validate(&self) -> Result<()> {
        let mut previous: Option<&FileDescriptor> = None;
        for (index, descriptor) in self.files.iter().enumerate() {
            if descriptor.table_position as usize != index {
                return Err(CorruptionError::TablePosition {
                    index,
                    found: descriptor.table_position,
                }
                .into());
            }
            if let Some(previous) = previous.filter(|p| descriptor.checksum < p.checksum) {
                return Err(CorruptionError::ChecksumOrder {
                    index,
                    previous: previous.checksum,
                    current: descriptor.checksum,
                }
                .into());
            }
            previous = Some(descriptor);
        }
        Ok(())
    }
}

/// Checks that the metadata and the data account for every byte of the archive, with each entry's
/// data placed right after the previous one
#[derive(Debug, Clone, Copy)]
pub struct SizeValidator<'a> {
    metadata: &'a ArchiveMetadata,
    bytes_read: u64,
    archive_len: u64,
}

impl<'a> SizeValidator<'a> {
    /// Creates a validator for metadata decoded from `bytes_read` bytes of an archive of
    /// `archive_len` bytes
    pub fn new(metadata: &'a ArchiveMetadata, bytes_read: u64, archive_len: u64) -> Self {
        SizeValidator {
            metadata,
            bytes_read,
            archive_len,
        }
    }
}

impl Validator for SizeValidator<'_> {
    fn validate(&self) -> Result<()> {
        let declared = self.metadata.size() as u64;
        if self.bytes_read != declared {
            return Err(CorruptionError::MetadataSize {
                expected: declared,
                actual: self.bytes_read,
            }
            .into());
        }

        // data follows the metadata with no gaps, in file table order
        let mut expected = self.bytes_read;
        for (index, file) in self.metadata.files().iter().enumerate() {
            if file.offset as u64 != expected {
                return Err(CorruptionError::DataOffset {
                    index,
                    expected,
                    found: file.offset,
                }
                .into());
            }
            expected += file.size as u64;
        }

        if self.archive_len != expected {
            return Err(CorruptionError::ArchiveSize {
                expected,
                actual: self.archive_len,
            }
            .into());
        }
        Ok(())
    }
}

/// Runs the structural and size validators on decoded metadata
#[derive(Debug, Clone, Copy)]
pub struct MetadataValidator<'a> {
    structural: StructuralValidator<'a>,
    size: SizeValidator<'a>,
}

impl<'a> MetadataValidator<'a> {
    /// Creates a validator for `decoded`
    pub fn new(decoded: &'a DecodedMetadata) -> Self {
        MetadataValidator {
            structural: StructuralValidator::new(decoded.metadata.files()),
            size: SizeValidator::new(&decoded.metadata, decoded.bytes_read, decoded.stream_len),
        }
    }
}

impl Validator for MetadataValidator<'_> {
    fn validate(&self) -> Result<()> {
        self.structural.validate()?;
        self.size.validate()
    }
}
