//! This library handles reading, validating and creating **MEG** archives used by *Alamo engine* games
//! such as *Star Wars: Empire at War*.
//!
//! # MEG Archive Format Documentation
//!
//! A MEG archive bundles game assets into a single file. The game looks each asset up by the
//! CRC-32 checksum of its uppercase path, so the file table is kept sorted by checksum.
//! MEG files are typically identified with the `.meg` extension.
//!
//! ## File Structure
//!
//! A MEG file of the first format version consists of a header, a name table, a file table and the data
//! of every file. The header and both tables together make up the archive's metadata.
//!
//! | Offset (bytes) | Field        | Description                                              |
//! |----------------|--------------|----------------------------------------------------------|
//! | 0x0000         | Name Count   | 4 bytes: Number of records in the name table             |
//! | 0x0004         | File Count   | 4 bytes: Number of records in the file table             |
//! | 0x0008         | Name Table   | `Name Count` variable-length name records                |
//! | ...            | File Table   | `File Count` file descriptors of 20 bytes each           |
//! | ...            | Data         | The data of each file, packed with no padding            |
//!
//! ### Header
//!
//! - **Name Count**: A 4-byte unsigned integer with the number of names.
//! - **File Count**: A 4-byte unsigned integer with the number of files. It must equal the name count.
//!
//! Neither count may exceed `i32::MAX`.
//!
//! ### Name Table
//!
//! | Offset (bytes) | Field  | Description                                  |
//! |----------------|--------|----------------------------------------------|
//! | 0x0000         | Length | 2 bytes: Number of bytes in the name         |
//! | 0x0002         | Name   | `Length` bytes, not null terminated          |
//!
//! Names are 8-bit strings. Any byte outside of ASCII is replaced by `?` when exposed as an entry path,
//! the raw name stays available.
//!
//! ### File Table
//!
//! | Offset (bytes) | Field          | Description                                           |
//! |----------------|----------------|-------------------------------------------------------|
//! | 0x0000         | CRC32          | 4 bytes: CRC-32 of the file's path                    |
//! | 0x0004         | Table Position | 4 bytes: Position of this record in the file table    |
//! | 0x0008         | Size           | 4 bytes: Size of the file's data                      |
//! | 0x000C         | Data Offset    | 4 bytes: Offset of the data from the archive's start  |
//! | 0x0010         | Name Index     | 4 bytes: Index of the file's name in the name table   |
//!
//! - **CRC32**: Uses the zlib polynomial. Records are sorted by this value, equal values keep the order
//!   they were added in.
//! - **Table Position**: Always equal to the position of the record.
//!
//! ### Data
//!
//! The data of each file follows the metadata, in the order of the file table. The archive ends with the
//! data of its last file, so its length is the metadata size plus the size of every file.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.meg`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Largest archive**: `u32::MAX` bytes, since offsets are 4 bytes
//!

pub mod binary;
pub mod checksum;
pub mod convert;
pub mod encoding;
pub mod error;
pub mod model;
pub mod normalize;
pub mod read;
pub mod types;
pub mod validate;
pub mod version;
pub mod write;

pub use checksum::{Checksum, ChecksumService, Crc32Checksum};
pub use encoding::Encoding;
pub use model::{Archive, DataEntry, DataLocation, EntryOrigin};
pub use normalize::{DefaultNormalizer, EngineNormalizer, PathNormalizer};
pub use read::MegArchive;
pub use version::ArchiveVersion;
pub use write::{BuildEntry, BuildOptions, DuplicatePolicy, MegBuilder};
