use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config_wizard::Configuration;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates a summary-epub.toml config file
    Config,
    /// Renders the book (the default when no command is given)
    Render(RenderArgs),
}

#[derive(Args, Debug, Default)]
pub struct RenderArgs {
    /// Summary file listing the chapters, overriding the configuration
    #[clap(long)]
    pub summary: Option<PathBuf>,
    /// Output EPUB file, overriding the configuration
    #[clap(long, short)]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    pub fn apply(&self, config: &mut Configuration) {
        if let Some(summary) = &self.summary {
            config.summary = summary.clone();
        }
        if let Some(output) = &self.output {
            config.epub.outfile = output.clone();
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Configuration file (summary-epub.toml is used if present)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}
