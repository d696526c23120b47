use alamo_meg::MegArchive;
use clap::Args;
use miette::{miette, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::{fs::File, path::PathBuf};
use tracing::error;

#[derive(Args)]
pub struct VerifyArgs {
    /// MEG files to check
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

impl VerifyArgs {
    pub fn handle(&self) -> Result<()> {
        let mut failed = 0;
        for path in &self.files {
            let result = File::open(path)
                .into_diagnostic()
                .and_then(|f| MegArchive::new(f).map_err(Into::into));

            match result {
                Ok(meg) => println!(
                    "{} {} ({} entries)",
                    "ok".green(),
                    path.display(),
                    meg.len()
                ),
                Err(e) => {
                    failed += 1;
                    println!("{} {}", "failed".red(), path.display());
                    error!("{}: {e:?}", path.display());
                }
            }
        }

        if failed > 0 {
            return Err(miette!("{failed} of {} archives failed", self.files.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use alamo_meg::{BuildOptions, MegBuilder};
    use miette::{IntoDiagnostic, Result};
    use std::fs;

    use super::VerifyArgs;

    #[test]
    fn reports_broken_archives() -> Result<()> {
        let dir = tempfile::tempdir().into_diagnostic()?;
        let good = dir.path().join("good.meg");
        MegBuilder::new(BuildOptions::default()).build(&good, Vec::new(), false)?;

        let bad = dir.path().join("bad.meg");
        fs::write(&bad, [1, 0, 0, 0, 2, 0, 0, 0]).into_diagnostic()?;

        assert!(VerifyArgs { files: vec![good.clone()] }.handle().is_ok());
        assert!(VerifyArgs { files: vec![good, bad] }.handle().is_err());

        Ok(())
    }
}
