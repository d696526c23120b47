//! Types for writing MEG archives
//!

use bon::Builder;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::binary::BinaryElement;
use crate::checksum::{Checksum, ChecksumService, Crc32Checksum};
use crate::convert;
use crate::encoding::Encoding;
use crate::error::{CorruptionError, Error, Result};
use crate::model::{Archive, DataEntry, DataLocation, EntryOrigin};
use crate::normalize::{self, DefaultNormalizer, PathNormalizer};
use crate::types::{to_index, FileDescriptor, Header, NameRecord};
use crate::version::ArchiveVersion;

/// How the builder treats two entries that are stored under the same name
///
/// Names are compared once normalized and encoded, so paths differing only in characters the
/// encoding cannot represent are duplicates.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail the build
    #[default]
    Reject,

    /// Keep the position of the first entry but take the data of the last one
    Overwrite,

    /// Store every entry
    Allow,
}

/// Options for how the MEG file should be built
#[derive(Debug, Builder)]
pub struct BuildOptions {
    /// Normalization applied to every target path
    #[builder(default = Box::new(DefaultNormalizer))]
    pub normalizer: Box<dyn PathNormalizer + Send + Sync>,

    /// How entries with equal normalized paths are treated
    #[builder(default)]
    pub duplicates: DuplicatePolicy,

    /// Encoding names are stored and hashed with
    #[builder(default)]
    pub encoding: Encoding,

    /// Checksum computed over each encoded path
    #[builder(default = Box::new(Crc32Checksum))]
    pub checksum: Box<dyn ChecksumService + Send + Sync>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions::builder().build()
    }
}

/// A file to be packed, along with the path it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEntry {
    /// Path inside the archive, before normalization
    pub target: String,

    /// Where the data comes from
    pub origin: EntryOrigin,
}

impl BuildEntry {
    /// Packs the file at `path` as `target`
    pub fn file(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        BuildEntry {
            target: target.into(),
            origin: EntryOrigin::File(path.into()),
        }
    }

    /// Packs `entry` of the archive at `archive` as `target`
    pub fn from_archive(
        target: impl Into<String>,
        archive: impl Into<PathBuf>,
        entry: DataEntry,
    ) -> Self {
        BuildEntry {
            target: target.into(),
            origin: EntryOrigin::from_archive(archive, entry),
        }
    }
}

/// Progress of a [`MegBuilder`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuildState {
    /// [`MegBuilder::build`] has not been called
    NotStarted,

    /// Entries are being checked, nothing has been written
    Validating,

    /// The temporary archive is being written
    Writing,

    /// The build finished, successfully or not
    Done,
}

#[derive(Debug)]
struct PlannedEntry {
    path: String,
    original_path: String,
    origin: EntryOrigin,
    checksum: Checksum,
    size: u32,
}

/// MEG archive generator
///
/// A builder packs exactly one archive. Everything is written into a hidden temporary file next to
/// the destination, which only replaces the destination once the archive is complete.
///
/// ```no_run
/// # fn doit() -> alamo_meg::error::Result<()>
/// # {
/// use alamo_meg::write::{BuildEntry, BuildOptions, MegBuilder};
///
/// let mut builder = MegBuilder::new(BuildOptions::default());
/// builder.build(
///     "patch.meg".as_ref(),
///     vec![BuildEntry::file("Data/XML/GameConstants.xml", "mod/GameConstants.xml")],
///     false,
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MegBuilder {
    options: BuildOptions,
    state: BuildState,
}

impl MegBuilder {
    /// Creates a builder using `options`
    pub fn new(options: BuildOptions) -> MegBuilder {
        MegBuilder {
            options,
            state: BuildState::NotStarted,
        }
    }

    /// Current state of the builder
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Packs `entries` into a new archive at `destination`.
    ///
    /// If `overwrite` is false an existing destination is an error. A destination that already
    /// exists is left untouched whenever the build fails.
    #[instrument(
        skip(self, destination, entries),
        fields(destination = %destination.display()),
        err
    )]
    pub fn build(
        &mut self,
        destination: &Path,
        entries: impl IntoIterator<Item = BuildEntry>,
        overwrite: bool,
    ) -> Result<()> {
        if self.state != BuildState::NotStarted {
            return Err(Error::InvalidOperation(
                "a builder can only build a single archive".into(),
            ));
        }

        self.state = BuildState::Validating;
        let result = self.run(destination, entries.into_iter().collect(), overwrite);
        self.state = BuildState::Done;
        result
    }

    fn run(&mut self, destination: &Path, entries: Vec<BuildEntry>, overwrite: bool) -> Result<()> {
        let directory = check_destination(destination, overwrite)?;
        let planned = self.plan(entries)?;

        let archive = layout(&planned, self.options.encoding)?;
        let metadata = convert::to_binary(&archive, self.options.encoding)?;

        self.state = BuildState::Writing;
        info!(
            entries = metadata.len(),
            size = metadata.size() as u64 + metadata.data_size(),
            "writing archive"
        );

        let mut temp = tempfile::Builder::new()
            .prefix(".meg-")
            .suffix(".tmp")
            .tempfile_in(directory)?;
        debug!(path = %temp.path().display(), "created temporary archive");

        {
            let mut out = BufWriter::new(temp.as_file_mut());
            metadata.write_bytes(&mut out)?;
            for entry in &planned {
                copy_entry(entry, &mut out)?;
            }
            out.flush()?;
        }
        temp.as_file().sync_all()?;

        let persisted = if overwrite {
            temp.persist(destination)
        } else {
            temp.persist_noclobber(destination)
        };
        persisted.map_err(|e| Error::IOError(e.error))?;

        Ok(())
    }

    /// Normalizes, checks, deduplicates, hashes and sizes the entries, sorted by checksum.
    fn plan(&self, entries: Vec<BuildEntry>) -> Result<Vec<PlannedEntry>> {
        let encoding = self.options.encoding;
        let mut planned: Vec<PlannedEntry> = Vec::with_capacity(entries.len());
        // keyed on the stored bytes, since the encoding may map distinct paths to one name
        let mut seen: HashMap<Vec<u8>, usize> = HashMap::with_capacity(entries.len());

        for BuildEntry { target, origin } in entries {
            let path = self.options.normalizer.normalize(&target);
            normalize::check_path(&path, encoding)?;

            let size = origin_size(&origin)?;
            let stored = encoding.encode(&path);
            let entry = PlannedEntry {
                checksum: self.options.checksum.checksum(&path, encoding),
                path,
                original_path: target,
                origin,
                size,
            };

            match (seen.get(&stored), self.options.duplicates) {
                (Some(&index), DuplicatePolicy::Reject) => {
                    return Err(Error::InvalidArgument(format!(
                        "{} and {} are both stored as {}",
                        planned[index].original_path,
                        entry.original_path,
                        String::from_utf8_lossy(&stored)
                    )));
                }
                (Some(&index), DuplicatePolicy::Overwrite) => {
                    debug!(path = %entry.path, "replacing duplicate entry");
                    planned[index] = entry;
                }
                _ => {
                    seen.entry(stored).or_insert(planned.len());
                    planned.push(entry);
                }
            }
        }

        to_index("entry count", planned.len())?;
        planned.sort_by_key(|e| e.checksum);
        Ok(planned)
    }
}

/// Checks the destination before anything is written, returning the directory it lives in.
fn check_destination(destination: &Path, overwrite: bool) -> Result<&Path> {
    if destination.as_os_str().is_empty() {
        return Err(Error::InvalidArgument("destination is empty".into()));
    }
    if destination.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "destination {} is a directory",
            destination.display()
        )));
    }

    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !directory.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory {} does not exist", directory.display()),
        )
        .into());
    }
    if !overwrite && destination.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        )
        .into());
    }
    Ok(directory)
}

fn origin_size(origin: &EntryOrigin) -> Result<u32> {
    let size = match origin {
        EntryOrigin::File(path) => {
            let metadata = fs::metadata(path)?;
            if !metadata.is_file() {
                return Err(Error::InvalidArgument(format!(
                    "{} is not a file",
                    path.display()
                )));
            }
            metadata.len()
        }
        EntryOrigin::Archive { archive, entry } => {
            if !archive.is_file() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("archive {} does not exist", archive.display()),
                )
                .into());
            }
            entry.location.size as u64
        }
    };

    u32::try_from(size).map_err(|_| Error::UnsupportedRange {
        what: "file size",
        value: size,
    })
}

/// Assigns each planned entry its offset, packing the data right behind the metadata.
fn layout(planned: &[PlannedEntry], encoding: Encoding) -> Result<Archive> {
    let names = planned
        .iter()
        .map(|e| NameRecord::new(&e.path, encoding).map(|n| n.size() as u64))
        .sum::<Result<u64>>()?;
    let metadata_size =
        Header::SIZE as u64 + names + planned.len() as u64 * FileDescriptor::SIZE as u64;

    let mut offset = metadata_size;
    let mut entries = Vec::with_capacity(planned.len());
    for entry in planned {
        let start = u32::try_from(offset).map_err(|_| Error::UnsupportedRange {
            what: "archive size",
            value: offset,
        })?;
        offset += entry.size as u64;

        entries.push(DataEntry {
            path: entry.path.clone(),
            checksum: entry.checksum,
            location: DataLocation {
                offset: start,
                size: entry.size,
            },
            encrypted: false,
            original_path: entry.original_path.clone(),
        });
    }
    if offset > u32::MAX as u64 {
        return Err(Error::UnsupportedRange {
            what: "archive size",
            value: offset,
        });
    }

    Ok(Archive::new(ArchiveVersion::V1, entries))
}

#[instrument(skip_all, fields(path = %entry.path), err)]
fn copy_entry<W: Write>(entry: &PlannedEntry, out: &mut W) -> Result<()> {
    let expected = entry.size as u64;
    let copied = match &entry.origin {
        EntryOrigin::File(path) => io::copy(&mut File::open(path)?.take(expected), out)?,
        EntryOrigin::Archive { archive, entry: stored } => {
            let mut source = File::open(archive)?;
            source.seek(SeekFrom::Start(stored.location.offset as u64))?;
            io::copy(&mut source.take(expected), out)?
        }
    };

    if copied != expected {
        return Err(CorruptionError::SourceTruncated {
            path: entry.path.clone(),
            expected,
            actual: copied,
        }
        .into());
    }
    Ok(())
}
