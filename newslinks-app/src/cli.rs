use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract article links from Google News results.
#[derive(Debug, Parser)]
#[command(name = "newslinks", version, about)]
pub struct Cli {
    /// YAML configuration file (default: ./newslinks.yaml, then the user
    /// config dir).
    #[arg(long, short, global = true, env = "NEWSLINKS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Mode {
    /// Interactive terminal UI (the default).
    Tui,
    /// Run one search and print the resolved links.
    Search {
        /// Keyword(s) to search for.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Number of links to collect.
        #[arg(long, short)]
        limit: Option<u32>,
        /// Result pages to scan.
        #[arg(long)]
        pages: Option<u32>,
        /// Print the debug trace after the links.
        #[arg(long)]
        debug: bool,
    },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        self.command.clone().unwrap_or(Mode::Tui)
    }
}
