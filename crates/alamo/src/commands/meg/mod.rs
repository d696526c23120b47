pub mod extract;
pub mod list;
pub mod merge;
pub mod pack;
pub mod verify;

use alamo_meg::{BuildOptions, DefaultNormalizer, DuplicatePolicy, EngineNormalizer};
use clap::ValueEnum;

#[derive(clap::Subcommand)]
pub enum MegCommands {
    /// List the entries of a MEG file
    List(list::ListArgs),
    /// Extract a MEG file into a directory
    Extract(extract::ExtractArgs),
    /// Pack a directory into a MEG file
    Pack(pack::PackArgs),
    /// Merge several MEG files into one
    Merge(merge::MergeArgs),
    /// Check that MEG files are well formed
    Verify(verify::VerifyArgs),
}

impl MegCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            MegCommands::List(list) => list.handle(),
            MegCommands::Extract(extract) => extract.handle(),
            MegCommands::Pack(pack) => pack.handle(),
            MegCommands::Merge(merge) => merge.handle(),
            MegCommands::Verify(verify) => verify.handle(),
        }
    }
}

/// What to do with entries sharing a path
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Duplicates {
    /// Fail
    #[default]
    Reject,
    /// Keep the last one
    Overwrite,
    /// Keep all of them
    Allow,
}

impl From<Duplicates> for DuplicatePolicy {
    fn from(value: Duplicates) -> Self {
        match value {
            Duplicates::Reject => DuplicatePolicy::Reject,
            Duplicates::Overwrite => DuplicatePolicy::Overwrite,
            Duplicates::Allow => DuplicatePolicy::Allow,
        }
    }
}

pub(crate) fn build_options(engine_paths: bool, duplicates: Duplicates) -> BuildOptions {
    let options = BuildOptions::builder().duplicates(duplicates.into());
    if engine_paths {
        options.normalizer(Box::new(EngineNormalizer)).build()
    } else {
        options.normalizer(Box::new(DefaultNormalizer)).build()
    }
}
