pub mod meg;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle MEG files
    Meg {
        #[command(subcommand)]
        command: meg::MegCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Meg { command } => command.handle(),
        }
    }
}
