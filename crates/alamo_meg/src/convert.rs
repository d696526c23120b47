//! Conversion between decoded [`ArchiveMetadata`] and the [`Archive`] domain model.

use tracing::instrument;

use crate::binary::BinaryTable;
use crate::encoding::Encoding;
use crate::error::{CorruptionError, Error, Result};
use crate::model::{Archive, DataEntry, DataLocation};
use crate::types::{to_index, ArchiveMetadata, FileDescriptor, Header, NameRecord};
use crate::version::ArchiveVersion;

/// Builds the domain model of `metadata`, keeping the stored order of the file table.
///
/// Names are resolved through each descriptor's name index. Checksums that decrease along the
/// table are reported even if the metadata was never validated.
#[instrument(skip(metadata), fields(entries = metadata.len()), err)]
pub fn to_model(metadata: &ArchiveMetadata, version: ArchiveVersion) -> Result<Archive> {
    let names = metadata.names();
    let mut entries: Vec<DataEntry> = Vec::with_capacity(metadata.len());

    for (index, descriptor) in metadata.files().iter().enumerate() {
        if let Some(previous) = entries.last().filter(|p| descriptor.checksum < p.checksum) {
            return Err(CorruptionError::ChecksumOrder {
                index,
                previous: previous.checksum,
                current: descriptor.checksum,
            }
            .into());
        }

        let name = names
            .get(descriptor.name_index as usize)
            .map_err(|_| CorruptionError::NameIndex {
                index,
                name_index: descriptor.name_index,
                len: names.len(),
            })?;

        entries.push(DataEntry {
            path: name.sanitized().to_owned(),
            checksum: descriptor.checksum,
            location: DataLocation {
                offset: descriptor.offset,
                size: descriptor.size,
            },
            // only versions with encryption store a flag in their descriptors
            encrypted: version.supports_encryption() && descriptor_encrypted(descriptor, version),
            original_path: name.original().to_owned(),
        });
    }

    Ok(Archive::new(version, entries))
}

/// The encryption flag stored in `descriptor`, for versions whose descriptors carry one.
fn descriptor_encrypted(_descriptor: &FileDescriptor, version: ArchiveVersion) -> bool {
    match version {
        ArchiveVersion::V1 => false,
    }
}

/// Builds the metadata for `archive`, storing names with `encoding`.
///
/// Entries are stably sorted by checksum and each record's table position and name index is its
/// final position in that order. Encrypted entries are rejected unless the archive's version
/// supports encryption.
#[instrument(skip(archive), fields(entries = archive.len()), err)]
pub fn to_binary(archive: &Archive, encoding: Encoding) -> Result<ArchiveMetadata> {
    let mut ordered: Vec<&DataEntry> = archive.iter().collect();
    ordered.sort_by_key(|e| e.checksum);

    let count = to_index("entry count", ordered.len())?;

    if let Some(entry) = ordered
        .iter()
        .find(|e| e.encrypted && !archive.version().supports_encryption())
    {
        return Err(Error::InvalidArgument(format!(
            "{} is encrypted, which {:?} archives cannot store",
            entry.path,
            archive.version()
        )));
    }

    let names = ordered
        .iter()
        .map(|e| NameRecord::new(&e.path, encoding))
        .collect::<Result<Vec<_>>>()?;

    let files = ordered
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let position = to_index("table position", i)?;
            Ok(FileDescriptor {
                checksum: e.checksum,
                table_position: position,
                size: e.location.size,
                offset: e.location.offset,
                name_index: position,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ArchiveMetadata::new(
        Header::new(count),
        BinaryTable::new(names),
        BinaryTable::new(files),
    )
}
