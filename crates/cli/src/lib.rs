mod pages;
mod routes;
mod shell;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scanline",
    version,
    about = "Deep-link navigation shell for a media library",
    long_about = "Scanline resolves deep links such as plex://movie/local/101 to pages, keeps a \
                  bounded back history and lets you browse a demo library from the terminal."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive shell that navigates the demo library
    #[command(
        long_about = "Starts an interactive shell where deep links can be opened, and history \
                            can be walked back or refreshed. Preferences are read from \
                            ~/.scanline/preferences.json."
    )]
    Shell {
        /// Deep link to open first. Defaults to the home page.
        #[arg(value_name = "PATH")]
        start: Option<String>,
        /// Override the maximum number of back entries from preferences
        #[arg(long, value_name = "SIZE")]
        history_size: Option<usize>,
    },
    /// List the registered route patterns
    Routes,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let _guard = scanline_runtime::init_logging("cli", false);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Shell {
            start,
            history_size,
        } => shell::run(rt.handle().clone(), start, history_size),
        Commands::Routes => routes::run(rt.handle().clone()),
    }
}
