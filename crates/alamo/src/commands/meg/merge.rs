use alamo_meg::{BuildEntry, MegArchive, MegBuilder};
use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{fs::File, path::PathBuf};
use tracing::info;

use super::{build_options, Duplicates};

#[derive(Args)]
pub struct MergeArgs {
    /// Input MEG files, later files take precedence
    #[arg(short, long = "input", value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// A target MEG file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Store paths the way the game looks them up, with backslashes
    #[arg(long, default_value_t = false)]
    engine_paths: bool,

    /// What to do with entries present in more than one input
    #[arg(long, value_enum, default_value_t = Duplicates::Overwrite)]
    duplicates: Duplicates,
}

impl MergeArgs {
    pub fn handle(&self) -> Result<()> {
        if self.inputs.iter().any(|input| input == &self.file) {
            return Err(miette!(
                "{} is both an input and the target",
                self.file.display()
            ));
        }

        let mut entries = Vec::new();
        for input in &self.inputs {
            let f = File::open(input)
                .into_diagnostic()
                .context(format!("path: {}", input.display()))?;
            let meg = MegArchive::new(f).context(format!("reading {}", input.display()))?;
            info!("merging {} entries from {}", meg.len(), input.display());

            entries.extend(
                meg.archive()
                    .iter()
                    .map(|e| BuildEntry::from_archive(e.original_path.clone(), input, e.clone())),
            );
        }

        MegBuilder::new(build_options(self.engine_paths, self.duplicates))
            .build(&self.file, entries, self.overwrite)
            .context(format!("creating {}", self.file.display()))?;

        Ok(())
    }
}
