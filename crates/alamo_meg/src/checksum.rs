//! CRC-32 checksums used to key and order archive entries.

use std::fmt;

use binrw::BinRead;
use crc::{Crc, CRC_32_ISO_HDLC};

use crate::encoding::Encoding;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// A CRC-32 of an encoded archive path
///
/// Entries in the file table are sorted by this value, so it is the primary lookup key of an
/// archive.
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[br(little)]
pub struct Checksum(pub u32);

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

impl From<u32> for Checksum {
    fn from(value: u32) -> Self {
        Checksum(value)
    }
}

impl From<Checksum> for u32 {
    fn from(value: Checksum) -> Self {
        value.0
    }
}

/// Computes the checksum of a path
pub trait ChecksumService: fmt::Debug {
    /// Checksum of `value` once encoded with `encoding`
    fn checksum(&self, value: &str, encoding: Encoding) -> Checksum;

    /// Checksum of already encoded bytes
    fn checksum_bytes(&self, bytes: &[u8]) -> Checksum;
}

/// The standard (zlib) CRC-32 used by the engine
#[derive(Debug, Default, Copy, Clone)]
pub struct Crc32Checksum;

impl ChecksumService for Crc32Checksum {
    fn checksum(&self, value: &str, encoding: Encoding) -> Checksum {
        self.checksum_bytes(&encoding.encode(value))
    }

    fn checksum_bytes(&self, bytes: &[u8]) -> Checksum {
        Checksum(CRC32.checksum(bytes))
    }
}
