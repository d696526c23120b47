//! Types for reading MEG archives
//!

use binrw::BinRead;
use std::{
    fmt::{self, Debug},
    io::{self, Read, Seek, SeekFrom},
};
use tracing::{debug, instrument};

use crate::{
    binary::{BinaryElement, BinaryTable},
    convert,
    encoding::Encoding,
    error::{self, CorruptionError, Error, FileNotFoundError, Result},
    model::{Archive, DataEntry},
    types::{check_index, ArchiveMetadata, FileDescriptor, Header, NameRecord},
    validate::Validator,
    version::ArchiveVersion,
};

/// Metadata decoded from a stream along with the byte accounting needed to validate it
#[derive(Debug, Clone)]
pub struct DecodedMetadata {
    /// The decoded metadata
    pub metadata: ArchiveMetadata,

    /// Number of bytes consumed while decoding
    pub bytes_read: u64,

    /// Number of bytes from the start of the archive to the end of the stream
    pub stream_len: u64,

    /// The format version the metadata was decoded as
    pub version: ArchiveVersion,
}

/// Decodes the metadata of an archive starting at the current position of `reader`.
///
/// The stream is only borrowed. On success it is left positioned right after the metadata.
pub fn read_metadata<R: Read + Seek>(reader: &mut R) -> Result<DecodedMetadata> {
    ArchiveVersion::V1.read_metadata(reader)
}

#[instrument(skip(reader), err)]
pub(crate) fn read_v1<R: Read + Seek>(reader: &mut R) -> Result<DecodedMetadata> {
    let start = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(start))?;

    let stream_len = end.saturating_sub(start);
    if stream_len == 0 {
        return Err(Error::InvalidArgument("stream is empty".into()));
    }

    let header = Header::read(reader).map_err(error::binrw_truncation)?;
    if header.name_count != header.file_count {
        return Err(CorruptionError::CountMismatch {
            names: header.name_count,
            files: header.file_count,
        }
        .into());
    }
    let count = check_index("file count", header.file_count)?;

    // Every entry needs at least a name length and a descriptor.
    let minimum = Header::SIZE as u64 + count as u64 * (2 + FileDescriptor::SIZE as u64);
    if minimum > stream_len {
        return Err(CorruptionError::Truncated.into());
    }

    let version = ArchiveVersion::V1;
    let names = read_name_table(reader, count, version.name_encoding())?;
    let files = read_file_table(reader, count)?;
    let bytes_read = reader.stream_position()? - start;

    debug!(entries = count, bytes_read, "decoded metadata");

    Ok(DecodedMetadata {
        metadata: ArchiveMetadata::new(header, names, files)?,
        bytes_read,
        stream_len,
        version,
    })
}

/// Reads `count` length-prefixed names.
pub(crate) fn read_name_table<R: Read>(
    reader: &mut R,
    count: u32,
    encoding: Encoding,
) -> Result<BinaryTable<NameRecord>> {
    (0..count)
        .map(|_| NameRecord::read(reader, encoding).map_err(error::truncation))
        .collect::<Result<Vec<_>>>()
        .map(BinaryTable::new)
}

/// Reads `count` file descriptors.
pub(crate) fn read_file_table<R: Read + Seek>(
    reader: &mut R,
    count: u32,
) -> Result<BinaryTable<FileDescriptor>> {
    (0..count)
        .map(|_| {
            let descriptor = FileDescriptor::read(reader).map_err(error::binrw_truncation)?;
            check_index("table position", descriptor.table_position)?;
            check_index("name index", descriptor.name_index)?;
            Ok(descriptor)
        })
        .collect::<Result<Vec<_>>>()
        .map(BinaryTable::new)
}

/// A struct for reading an entry from a MEG file
pub struct MegFile<'a, R: Read + Seek> {
    entry: &'a DataEntry,
    reader: io::Take<&'a mut R>,
}

impl<'a, R: Read + Seek> Debug for MegFile<'a, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MegFile({:#?})", self.entry)
    }
}

/// Methods for retrieving information on MEG file entries
impl<'a, R: Read + Seek> MegFile<'a, R> {
    /// Get the path of the file
    ///
    /// # Warnings
    ///
    /// It is dangerous to use this path directly when extracting an archive.
    /// It may contain an absolute path (`/etc/shadow`), or break out of the
    /// current directory (`../runtime`). Carelessly writing to these paths
    /// allows an attacker to craft a MEG archive that will overwrite critical
    /// files.
    pub fn path(&self) -> &str {
        &self.entry.path
    }

    /// Get the size of the file, in bytes
    pub fn size(&self) -> u64 {
        self.entry.location.size as u64
    }

    /// Get the offset of the file's data from the start of the archive
    pub fn data_start(&self) -> u64 {
        self.entry.location.offset as u64
    }

    /// Get the full entry this file was opened from
    pub fn entry(&self) -> &DataEntry {
        self.entry
    }
}

impl<R: Read + Seek> Read for MegFile<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// MEG archive reader
///
/// Opening an archive decodes its metadata, validates it and converts it into an [`Archive`].
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_meg_contents(reader: impl Read + Seek) -> alamo_meg::error::Result<()> {
///     let mut meg = alamo_meg::MegArchive::new(reader)?;
///
///     for i in 0..meg.len() {
///         let mut file = meg.by_index(i)?;
///         println!("Filename: {}", file.path());
///         std::io::copy(&mut file, &mut std::io::stdout())?;
///     }
///
///     Ok(())
/// }
/// ```
pub struct MegArchive<R> {
    reader: R,
    start: u64,
    metadata: ArchiveMetadata,
    archive: Archive,
}

impl<R> MegArchive<R> {
    /// Number of entries contained in this MEG.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Whether this MEG archive contains no entries
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// The entries of this archive, in file table order
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// The entries of this archive, in file table order
    pub fn entries(&self) -> &[DataEntry] {
        self.archive.entries()
    }

    /// The decoded metadata
    pub fn metadata(&self) -> &ArchiveMetadata {
        &self.metadata
    }

    /// Total size of the entries' data
    pub fn data_size(&self) -> u64 {
        self.metadata.data_size()
    }

    /// Get the index of the first entry with the given path, if it's present.
    #[inline(always)]
    pub fn index_for_path(&self, path: &str) -> Option<usize> {
        self.archive.index_for_path(path)
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> MegArchive<R> {
    /// Read a MEG archive starting at the current position of `reader`.
    #[instrument(skip(reader), err)]
    pub fn new(mut reader: R) -> Result<MegArchive<R>> {
        let start = reader.stream_position()?;
        let decoded = read_metadata(&mut reader)?;
        decoded.version.validator(&decoded).validate()?;

        let archive = convert::to_model(&decoded.metadata, decoded.version)?;
        debug!(
            entries = archive.len(),
            metadata = decoded.metadata.size(),
            "opened archive"
        );

        Ok(MegArchive {
            reader,
            start,
            metadata: decoded.metadata,
            archive,
        })
    }

    /// Search for the first entry with the given path
    pub fn by_path(&mut self, path: &str) -> Result<MegFile<'_, R>> {
        let Some(index) = self.index_for_path(path) else {
            return Err(Error::FileNotFound(FileNotFoundError::Path(path.to_owned())));
        };
        self.by_index(index)
    }

    /// Get a contained file by index
    pub fn by_index(&mut self, file_number: usize) -> Result<MegFile<'_, R>> {
        let entry = self
            .archive
            .get(file_number)
            .ok_or(Error::FileNotFound(FileNotFoundError::Index(file_number)))?;

        self.reader
            .seek(SeekFrom::Start(self.start + entry.location.offset as u64))?;

        Ok(MegFile {
            entry,
            reader: self.reader.by_ref().take(entry.location.size as u64),
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::prelude::*;
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use crate::checksum::Checksum;
    use crate::error::{CorruptionError, Error, Result};
    use crate::read::{read_metadata, MegArchive};

    #[rustfmt::skip]
    const HELLO_WORLD: [u8; 87] = [
        // Header (8)
        0x02, 0x00, 0x00, 0x00,
        0x02, 0x00, 0x00, 0x00,
        // Names (14)
        0x05, 0x00, b'A', b'.', b'T', b'X', b'T',
        0x05, 0x00, b'B', b'.', b'T', b'X', b'T',
        // Files (40)
        0x34, 0x9A, 0x8D, 0x96,
        0x00, 0x00, 0x00, 0x00,
        0x0B, 0x00, 0x00, 0x00,
        0x3E, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,

        0xE4, 0xE0, 0x2D, 0xD1,
        0x01, 0x00, 0x00, 0x00,
        0x0E, 0x00, 0x00, 0x00,
        0x49, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00,
        // Data (25)
        0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x57, 0x6F, 0x72, 0x6C, 0x64,
        0x57, 0x6F, 0x72, 0x6C, 0x64, 0x20, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0x21, 0x21, 0x21,
    ];

    #[test]
    fn read_empty_stream() {
        let result = read_metadata(&mut Cursor::new(Vec::new()));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn read_mismatched_counts() {
        let input = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
        let result = read_metadata(&mut Cursor::new(input));
        assert!(matches!(
            result,
            Err(Error::Corruption(CorruptionError::CountMismatch { names: 1, files: 2 }))
        ));
    }

    #[test]
    fn read_truncated_header() {
        let result = read_metadata(&mut Cursor::new([0x00, 0x00, 0x00]));
        assert!(matches!(
            result,
            Err(Error::Corruption(CorruptionError::Truncated))
        ));
    }

    #[test]
    fn read_truncated_tables() {
        for length in [9, 20, 40, 61] {
            let result = read_metadata(&mut Cursor::new(&HELLO_WORLD[..length]));
            assert!(
                matches!(result, Err(Error::Corruption(CorruptionError::Truncated))),
                "length {length}"
            );
        }
    }

    #[test]
    fn read_oversized_count() {
        let input = [0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x80];
        let result = read_metadata(&mut Cursor::new(input));
        assert!(matches!(result, Err(Error::UnsupportedRange { .. })));
    }

    #[test]
    fn read_oversized_table_position() {
        let mut input = HELLO_WORLD;
        input[26..30].copy_from_slice(&0x8000_0000u32.to_le_bytes());

        let result = read_metadata(&mut Cursor::new(input));
        assert!(matches!(
            result,
            Err(Error::UnsupportedRange {
                what: "table position",
                value: 0x8000_0000
            })
        ));
    }

    #[test]
    fn read_oversized_name_index() {
        let mut input = HELLO_WORLD;
        input[58..62].copy_from_slice(&0x8000_0000u32.to_le_bytes());

        let result = read_metadata(&mut Cursor::new(input));
        assert!(matches!(
            result,
            Err(Error::UnsupportedRange {
                what: "name index",
                value: 0x8000_0000
            })
        ));
    }

    #[test]
    fn read_empty_archive() -> Result<()> {
        let decoded = read_metadata(&mut Cursor::new([0u8; 8]))?;
        assert!(decoded.metadata.is_empty());
        assert_eq!(decoded.bytes_read, 8);
        assert_eq!(decoded.stream_len, 8);

        let archive = MegArchive::new(Cursor::new([0u8; 8]))?;
        assert!(archive.is_empty());

        Ok(())
    }

    #[test]
    fn read_metadata_leaves_stream_after_tables() -> Result<()> {
        let mut input = Cursor::new(HELLO_WORLD);
        let decoded = read_metadata(&mut input)?;

        assert_eq!(decoded.bytes_read, 62);
        assert_eq!(input.position(), 62);
        assert_eq!(decoded.stream_len, HELLO_WORLD.len() as u64);
        assert_eq!(decoded.metadata.names().get(1)?.original(), "B.TXT");
        assert_eq!(
            decoded.metadata.files().get(1)?.checksum,
            Checksum(0xD12DE0E4)
        );

        Ok(())
    }

    #[test]
    fn read_archive_with_entries() -> Result<()> {
        let mut archive = MegArchive::new(Cursor::new(HELLO_WORLD))?;
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.data_size(), 25);

        let mut buffer = Vec::new();

        let mut first = archive.by_index(0)?;
        assert_eq!(first.data_start(), 62);
        assert_eq!(first.path(), "A.TXT");
        first.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"Hello World");
        buffer.clear();

        let mut second = archive.by_path("B.TXT")?;
        assert_eq!(second.data_start(), 73);
        assert_eq!(second.size(), 14);
        second.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"World Hello!!!");

        assert!(matches!(
            archive.by_index(2),
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(
            archive.by_path("C.TXT"),
            Err(Error::FileNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn read_archive_at_offset() -> Result<()> {
        let mut input = vec![0xFFu8; 4];
        input.extend_from_slice(&HELLO_WORLD);

        let mut reader = Cursor::new(input);
        reader.seek(std::io::SeekFrom::Start(4))?;

        let mut archive = MegArchive::new(reader)?;
        let mut buffer = Vec::new();
        archive.by_index(0)?.read_to_end(&mut buffer)?;
        assert_eq!(buffer, b"Hello World");

        Ok(())
    }

    #[test]
    fn read_archive_with_trailing_bytes() {
        let mut input = HELLO_WORLD.to_vec();
        input.push(0x00);

        let result = MegArchive::new(Cursor::new(input));
        assert!(matches!(
            result,
            Err(Error::Corruption(CorruptionError::ArchiveSize {
                expected: 87,
                actual: 88
            }))
        ));
    }

    #[test]
    fn read_archive_with_unsorted_files() {
        let mut input = HELLO_WORLD;
        // swap the checksums of both descriptors
        input[22..26].copy_from_slice(&[0xE4, 0xE0, 0x2D, 0xD1]);
        input[42..46].copy_from_slice(&[0x34, 0x9A, 0x8D, 0x96]);

        let result = MegArchive::new(Cursor::new(input));
        assert!(matches!(
            result,
            Err(Error::Corruption(CorruptionError::ChecksumOrder { index: 1, .. }))
        ));
    }

    #[test]
    fn read_archive_with_data_outside_the_file() {
        let mut input = HELLO_WORLD;
        input[34..38].copy_from_slice(&0xFFF0u32.to_le_bytes());

        let result = MegArchive::new(Cursor::new(input));
        assert!(matches!(
            result,
            Err(Error::Corruption(CorruptionError::DataOffset {
                index: 0,
                expected: 62,
                found: 0xFFF0
            }))
        ));
    }
}
