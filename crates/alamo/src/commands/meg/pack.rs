use alamo_meg::{BuildEntry, MegBuilder};
use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use super::{build_options, Duplicates};

#[derive(Args)]
pub struct PackArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target MEG file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Store paths the way the game looks them up, with backslashes
    #[arg(long, default_value_t = false)]
    engine_paths: bool,

    /// What to do with files whose paths collide once normalized
    #[arg(long, value_enum, default_value_t)]
    duplicates: Duplicates,
}

/// Collects every file below `directory`, targeted at its path relative to it.
pub(crate) fn collect(directory: &Path) -> Result<Vec<BuildEntry>> {
    let files = WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .collect::<Vec<_>>();

    if files.is_empty() {
        return Err(miette!("directory is empty"));
    }

    files
        .into_iter()
        .map(|file| {
            let name = file.path().strip_prefix(directory).into_diagnostic()?;
            let target = name
                .to_str()
                .ok_or(miette!("unable to convert {} to a string", name.display()))?;
            Ok(BuildEntry::file(target, file.path()))
        })
        .collect()
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        info!("creating {}", &self.file.display());

        let entries = collect(&self.directory)?;
        info!("packing {} files", entries.len());

        MegBuilder::new(build_options(self.engine_paths, self.duplicates))
            .build(&self.file, entries, self.overwrite)
            .context(format!("packing {}", self.directory.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use alamo_meg::MegArchive;
    use miette::{IntoDiagnostic, Result};
    use std::fs::{self, File};

    use super::PackArgs;
    use crate::commands::meg::Duplicates;

    #[test]
    fn pack_directory() -> Result<()> {
        let dir = tempfile::tempdir().into_diagnostic()?;
        let source = dir.path().join("mod");
        fs::create_dir_all(source.join("Data").join("XML")).into_diagnostic()?;
        fs::write(source.join("Data").join("XML").join("A.xml"), b"<A/>").into_diagnostic()?;
        fs::write(source.join("Data").join("b.txt"), b"b").into_diagnostic()?;

        let args = PackArgs {
            directory: source,
            file: dir.path().join("mod.meg"),
            overwrite: false,
            engine_paths: true,
            duplicates: Duplicates::Reject,
        };
        args.handle()?;

        let meg = MegArchive::new(File::open(&args.file).into_diagnostic()?)?;
        assert_eq!(meg.len(), 2);
        assert!(meg.index_for_path("DATA\\XML\\A.XML").is_some());
        assert!(meg.index_for_path("DATA\\B.TXT").is_some());

        assert!(args.handle().is_err());

        Ok(())
    }

    #[test]
    fn empty_directory_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir().into_diagnostic()?;
        assert!(super::collect(dir.path()).is_err());
        Ok(())
    }
}
