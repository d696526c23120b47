use alamo_meg::{normalize::check_path, read::MegFile, Encoding, MegArchive};
use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

#[derive(Args)]
pub struct ExtractArgs {
    /// An input MEG file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Maps an archive path below `directory`, refusing paths that would leave it.
pub(crate) fn target_path(directory: &Path, path: &str) -> Result<PathBuf> {
    check_path(path, Encoding::Latin1)?;
    Ok(path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .fold(directory.to_path_buf(), |p, s| p.join(s)))
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let mut f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let mut meg = MegArchive::new(&mut f)?;

        let count = meg.len();
        for i in 0..count {
            let mut f_meg: MegFile<'_, &mut File> = meg.by_index(i)?;

            let p = match target_path(&self.directory, f_meg.path()) {
                Ok(p) => p,
                Err(e) => {
                    warn!("skipping {}: {e}", f_meg.path());
                    continue;
                }
            };
            info!("writing {}", p.display());

            let parent = p
                .parent()
                .ok_or(miette!("{} has no parent directory", p.display()))?;
            std::fs::create_dir_all(parent)
                .into_diagnostic()
                .context(format!("creating {}", parent.display()))?;
            let mut out = if !self.overwrite {
                File::create_new(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            } else {
                File::create(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            };

            std::io::copy(&mut f_meg, &mut out).into_diagnostic()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::target_path;

    #[test]
    fn paths_stay_inside_directory() -> miette::Result<()> {
        let dir = Path::new("out");
        assert_eq!(
            target_path(dir, "DATA\\XML/A.XML")?,
            dir.join("DATA").join("XML").join("A.XML")
        );
        assert!(target_path(dir, "../A.XML").is_err());
        assert!(target_path(dir, "/ETC/SHADOW").is_err());
        assert!(target_path(dir, "C:\\A.XML").is_err());
        Ok(())
    }
}
