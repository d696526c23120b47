//! Domain model of an archive: entries consumers and builders operate on.

use std::path::PathBuf;

use crate::checksum::Checksum;
use crate::version::ArchiveVersion;

/// Where the data of an entry is stored inside its archive
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DataLocation {
    /// Offset from the start of the archive
    pub offset: u32,

    /// Size in bytes
    pub size: u32,
}

/// A single entry of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    /// ASCII-only path of the entry
    pub path: String,

    /// Checksum of the entry's path, as stored in the archive
    pub checksum: Checksum,

    /// Location of the entry's data
    pub location: DataLocation,

    /// Whether the entry's data is encrypted
    pub encrypted: bool,

    /// Path as it was stored or supplied, before sanitizing or normalization
    pub original_path: String,
}

/// An ordered collection of entries, in ascending checksum order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Archive {
    version: ArchiveVersion,
    entries: Vec<DataEntry>,
}

impl Archive {
    /// Creates an archive from entries in their stored order
    pub fn new(version: ArchiveVersion, entries: Vec<DataEntry>) -> Self {
        Archive { version, entries }
    }

    /// The format version of this archive
    pub fn version(&self) -> ArchiveVersion {
        self.version
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this archive holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by its position
    pub fn get(&self, index: usize) -> Option<&DataEntry> {
        self.entries.get(index)
    }

    /// The entries, in stored order
    pub fn entries(&self) -> &[DataEntry] {
        &self.entries
    }

    /// Iterates the entries in stored order
    pub fn iter(&self) -> std::slice::Iter<'_, DataEntry> {
        self.entries.iter()
    }

    /// Position of the first entry with the given path
    ///
    /// Archives may hold several entries with the same path; the first one wins.
    pub fn index_for_path(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.path == path)
    }
}

impl<'a> IntoIterator for &'a Archive {
    type Item = &'a DataEntry;
    type IntoIter = std::slice::Iter<'a, DataEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Where the builder takes the data of an entry from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOrigin {
    /// A file on disk
    File(PathBuf),

    /// An entry inside an existing archive file
    Archive {
        /// Path to the archive holding the entry
        archive: PathBuf,

        /// The entry, as read from that archive
        entry: DataEntry,
    },
}

impl EntryOrigin {
    /// Refers to `entry` inside the archive at `archive`
    pub fn from_archive(archive: impl Into<PathBuf>, entry: DataEntry) -> Self {
        EntryOrigin::Archive {
            archive: archive.into(),
            entry,
        }
    }
}
