use anyhow::{anyhow, Context, Result};
use cli::{Cli, Commands, RenderArgs};
use config_wizard::Configuration;
use convert::Conversion;
use indicatif::{ProgressBar, ProgressStyle};
use source::Source;
use std::path::Path;
use std::process::ExitCode;

mod book;
mod cli;
mod config_wizard;
mod convert;
mod sinks;
mod source;

fn main() -> ExitCode {
    env_logger::init();

    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => config_wizard::run(
            cli.config
                .as_deref()
                .unwrap_or(Path::new(config_wizard::DEFAULT_CONFIG_FILE)),
        ),
        Some(Commands::Render(args)) => render(cli.config.as_deref(), &args),
        None => render(cli.config.as_deref(), &RenderArgs::default()),
    }
}

fn render(config_path: Option<&Path>, args: &RenderArgs) -> Result<()> {
    let mut config = Configuration::load(config_path)?;
    args.apply(&mut config);
    let Configuration { summary, epub } = config;

    if !summary.is_file() {
        return Err(anyhow!("{} not found.", summary.display()));
    }

    println!("Parsing {}...", summary.display());
    let source = Source::load(&summary)?;
    println!("{} Starting conversion...", chapters_found(&source));

    let stylesheet = sinks::load_stylesheet(&epub)?;

    let progress = ProgressBar::new(source.chapters.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("can parse progress style")
            .progress_chars("#>-"),
    );

    let Conversion { book, warnings } =
        convert::assemble(&source, epub.metadata.clone(), stylesheet, &progress);

    let stats = epub
        .render(&book, &progress)
        .with_context(|| "Failed to render EPUB")?;

    println!();
    println!(
        "{} {}",
        console::style("Successfully created EPUB:").green(),
        epub.outfile.display()
    );
    println!("  Chapters: {}", stats.document_count);
    println!("  Images:   {}", stats.image_count);
    if !warnings.is_empty() {
        println!("  Warnings: {}", warnings.len());
    }

    Ok(())
}

fn chapters_found(source: &Source) -> String {
    format!("{} chapters found.", source.chapters.len())
}
