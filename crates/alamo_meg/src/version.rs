//! The closed set of MEG format versions this crate understands.

use std::io::{Read, Seek};

use crate::encoding::Encoding;
use crate::error::Result;
use crate::read::{self, DecodedMetadata};
use crate::validate::MetadataValidator;

/// Version of the MEG format
///
/// Only the first version is implemented. Later versions add per-entry encryption; they will be
/// added as variants here, with [`ArchiveVersion::supports_encryption`] reporting the capability.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ArchiveVersion {
    /// The original format shipped with the first Alamo titles
    #[default]
    V1,
}

impl ArchiveVersion {
    /// Decodes the metadata at the current position of `reader` using this version's layout
    pub fn read_metadata<R: Read + Seek>(&self, reader: &mut R) -> Result<DecodedMetadata> {
        match self {
            ArchiveVersion::V1 => read::read_v1(reader),
        }
    }

    /// The validator enforcing this version's structural rules
    pub fn validator<'a>(&self, decoded: &'a DecodedMetadata) -> MetadataValidator<'a> {
        match self {
            ArchiveVersion::V1 => MetadataValidator::new(decoded),
        }
    }

    /// Whether entries of this version may be encrypted
    pub fn supports_encryption(&self) -> bool {
        match self {
            ArchiveVersion::V1 => false,
        }
    }

    /// Encoding names are decoded with
    ///
    /// Third-party tools wrote extended Latin characters into names, so decoding is lenient.
    pub fn name_encoding(&self) -> Encoding {
        match self {
            ArchiveVersion::V1 => Encoding::Latin1,
        }
    }
}
