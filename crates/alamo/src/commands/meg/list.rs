use alamo_meg::MegArchive;
use clap::{Args, ValueEnum};
use itertools::Itertools;
use miette::{Context, IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::{fs::File, io::Write, path::PathBuf};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Order {
    /// File table order
    #[default]
    Table,
    /// By path
    Path,
    /// By size, largest first
    Size,
}

#[derive(Args)]
pub struct ListArgs {
    /// An input MEG file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Show checksums, offsets and sizes
    #[arg(short, long, default_value_t = false)]
    long: bool,

    /// Order of the listing
    #[arg(long, value_enum, default_value_t)]
    sort: Order,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let meg = MegArchive::new(f)?;

        let entries = meg
            .archive()
            .iter()
            .sorted_by(|a, b| match self.sort {
                Order::Table => std::cmp::Ordering::Equal,
                Order::Path => a.path.cmp(&b.path),
                Order::Size => b.location.size.cmp(&a.location.size),
            })
            .collect_vec();

        let mut out = std::io::stdout().lock();
        if self.long {
            writeln!(
                out,
                "{}",
                format!("{:<10} {:>10} {:>10}  {}", "crc32", "offset", "size", "path").bold()
            )
            .into_diagnostic()?;
            for entry in entries {
                writeln!(
                    out,
                    "{} {:>10} {:>10}  {}",
                    entry.checksum.cyan(),
                    entry.location.offset,
                    entry.location.size,
                    entry.path
                )
                .into_diagnostic()?;
            }
            writeln!(
                out,
                "{} entries, {} bytes of data",
                meg.len(),
                meg.data_size()
            )
            .into_diagnostic()?;
        } else {
            writeln!(out, "{}", entries.iter().map(|e| &e.path).join("\n")).into_diagnostic()?;
        }

        Ok(())
    }
}
