//! Base types for the structure of a MEG file.

use std::io::{self, Read, Write};

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::binary::{BinaryElement, BinaryTable};
use crate::checksum::Checksum;
use crate::encoding::{self, Encoding};
use crate::error::{CorruptionError, Error, Result};

/// Largest count or index an archive may hold
///
/// Counts are stored unsigned but indexed as signed 32-bit values by the engine and most tools.
pub const MAX_INDEX: u32 = i32::MAX as u32;

/// Rejects `value` if it exceeds [`MAX_INDEX`].
pub(crate) fn check_index(what: &'static str, value: u32) -> Result<u32> {
    if value > MAX_INDEX {
        return Err(Error::UnsupportedRange {
            what,
            value: value as u64,
        });
    }
    Ok(value)
}

/// Converts an in-memory count into its stored form.
pub(crate) fn to_index(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_INDEX)
        .ok_or(Error::UnsupportedRange {
            what,
            value: value as u64,
        })
}

/// MEG file header
///
/// Both counts are stored, and both must be equal.
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct Header {
    /// The number of records in the name table
    pub name_count: u32,

    /// The number of records in the file table
    pub file_count: u32,
}

impl Header {
    /// Encoded size of a header
    pub const SIZE: usize = 8;

    /// Creates a header for an archive of `count` files
    pub fn new(count: u32) -> Self {
        Header {
            name_count: count,
            file_count: count,
        }
    }
}

impl BinaryElement for Header {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn write_bytes<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.name_count)?;
        writer.write_u32::<LittleEndian>(self.file_count)
    }
}

/// A path stored in the name table
///
/// Holds the bytes as stored, the string they decode to, and an ASCII-only variant of that string
/// which is safe to hand to the engine's file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    bytes: Box<[u8]>,
    encoding: Encoding,
    original: Box<str>,
    sanitized: Box<str>,
}

impl NameRecord {
    /// Encodes `path` into a new name record
    pub fn new(path: &str, encoding: Encoding) -> Result<Self> {
        let bytes = encoding.encode(path);
        if bytes.len() > u16::MAX as usize {
            return Err(Error::UnsupportedRange {
                what: "name length",
                value: bytes.len() as u64,
            });
        }
        Ok(Self::from_bytes(bytes, encoding))
    }

    /// Creates a name record from bytes read out of an archive
    pub(crate) fn from_bytes(bytes: Vec<u8>, encoding: Encoding) -> Self {
        let original = encoding.decode(&bytes);
        let sanitized = encoding::sanitize(&original);
        NameRecord {
            bytes: bytes.into(),
            encoding,
            original: original.into(),
            sanitized: sanitized.into(),
        }
    }

    /// Reads a length-prefixed name.
    pub fn read<R: Read>(reader: &mut R, encoding: Encoding) -> io::Result<Self> {
        let length = reader.read_u16::<LittleEndian>()?;
        let mut bytes = vec![0u8; length as usize];
        reader.read_exact(&mut bytes)?;
        Ok(Self::from_bytes(bytes, encoding))
    }

    /// The name as decoded from its bytes
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The name with every non-ASCII character replaced
    pub fn sanitized(&self) -> &str {
        &self.sanitized
    }

    /// The stored bytes of the name
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    /// The encoding the bytes are stored in
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl BinaryElement for NameRecord {
    fn size(&self) -> usize {
        2 + self.bytes.len()
    }

    fn write_bytes<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        // length is bounded to u16 on construction
        writer.write_u16::<LittleEndian>(self.bytes.len() as u16)?;
        writer.write_all(&self.bytes)
    }
}

/// MEG file table record
///
/// Locates the data of one entry. The on-disk field order is checksum, table position, size, offset
/// and name index.
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct FileDescriptor {
    /// A CRC-32 of the entry's encoded path
    pub checksum: Checksum,

    /// The position of this record in the file table
    pub table_position: u32,

    /// The size of the entry's data
    pub size: u32,

    /// The offset to the entry's data from the start of the archive
    pub offset: u32,

    /// The index of the entry's name in the name table
    pub name_index: u32,
}

impl FileDescriptor {
    /// Encoded size of a file record
    pub const SIZE: usize = 20;
}

impl BinaryElement for FileDescriptor {
    fn size(&self) -> usize {
        Self::SIZE
    }

    fn write_bytes<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.checksum.0)?;
        writer.write_u32::<LittleEndian>(self.table_position)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.name_index)
    }
}

/// Everything stored in front of the data of an archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMetadata {
    header: Header,
    names: BinaryTable<NameRecord>,
    files: BinaryTable<FileDescriptor>,
    size: usize,
}

impl ArchiveMetadata {
    /// Assembles metadata, checking that the header matches both tables
    pub fn new(
        header: Header,
        names: BinaryTable<NameRecord>,
        files: BinaryTable<FileDescriptor>,
    ) -> Result<Self> {
        if header.name_count != header.file_count {
            return Err(CorruptionError::CountMismatch {
                names: header.name_count,
                files: header.file_count,
            }
            .into());
        }
        if names.len() != header.name_count as usize || files.len() != header.file_count as usize
        {
            return Err(CorruptionError::CountMismatch {
                names: to_index("name count", names.len())?,
                files: to_index("file count", files.len())?,
            }
            .into());
        }

        let size = header.size() + names.size() + files.size();
        Ok(ArchiveMetadata {
            header,
            names,
            files,
            size,
        })
    }

    /// Metadata of an archive without entries
    pub fn empty() -> Self {
        ArchiveMetadata {
            header: Header::default(),
            names: BinaryTable::default(),
            files: BinaryTable::default(),
            size: Header::SIZE,
        }
    }

    /// The header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The name table
    pub fn names(&self) -> &BinaryTable<NameRecord> {
        &self.names
    }

    /// The file table
    pub fn files(&self) -> &BinaryTable<FileDescriptor> {
        &self.files
    }

    /// Number of entries described by this metadata
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether this metadata describes no entries
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of the sizes of all entries' data
    pub fn data_size(&self) -> u64 {
        self.files.iter().map(|f| f.size as u64).sum()
    }
}

impl BinaryElement for ArchiveMetadata {
    fn size(&self) -> usize {
        self.size
    }

    fn write_bytes<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header.write_bytes(writer)?;
        self.names.write_bytes(writer)?;
        self.files.write_bytes(writer)
    }
}
