//! Configuration file handling and the interactive wizard for creating `summary-epub.toml`.
//!
//! The configuration file is optional: without one the stock book is built
//! from `SUMMARY.md` with the default metadata. The wizard collects the
//! summary location, book metadata and EPUB output options through a series
//! of prompts.

use crate::book::Metadata;
use crate::sinks::EPUB;
use anyhow::{anyhow, Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file read when no other is named on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "summary-epub.toml";

/// Complete configuration for a summary-epub project.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    /// The summary file listing the chapters
    pub summary: PathBuf,
    pub epub: EPUB,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            summary: PathBuf::from("SUMMARY.md"),
            epub: EPUB::default(),
        }
    }
}

impl Configuration {
    /// Load the configuration.
    ///
    /// An explicitly named file must exist. Without one, `summary-epub.toml`
    /// is used if present and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Configuration> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Configuration::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Run the interactive configuration wizard.
///
/// Prompts the user for the summary location, book metadata and output file,
/// then writes the configuration to `path`.
pub fn run(path: &Path) -> Result<()> {
    let theme = ColorfulTheme {
        ..ColorfulTheme::default()
    };
    let defaults = Configuration::default();

    let summary: String = Input::with_theme(&theme)
        .with_prompt("Summary file")
        .default(defaults.summary.display().to_string())
        .interact()
        .with_context(|| "Failed to obtain summary path")?;
    let summary = PathBuf::from(summary);
    if !summary.is_file() {
        return Err(anyhow!("Path '{}' isn't a file!", summary.display()));
    }

    let metadata = Metadata::default();
    let title: String = Input::with_theme(&theme)
        .with_prompt("Book title")
        .with_initial_text(metadata.title)
        .allow_empty(false)
        .interact()
        .with_context(|| "Failed to obtain title")?;
    let author: String = Input::with_theme(&theme)
        .with_prompt("Author")
        .default(metadata.author)
        .interact()
        .with_context(|| "Failed to obtain author")?;
    let language: String = Input::with_theme(&theme)
        .with_prompt("Language code (e.g. zh, en, en-GB)")
        .default(metadata.language)
        .interact()
        .with_context(|| "Failed to obtain language")?;
    let toc_title: String = Input::with_theme(&theme)
        .with_prompt("Table of contents heading")
        .default(metadata.toc_title)
        .interact()
        .with_context(|| "Failed to obtain table of contents heading")?;
    let identifier: String = Input::with_theme(&theme)
        .with_prompt("Unique book identifier")
        .default(metadata.identifier)
        .interact()
        .with_context(|| "Failed to obtain identifier")?;
    let description: String = Input::with_theme(&theme)
        .with_prompt("Description (leave empty for none)")
        .allow_empty(true)
        .interact()?;

    let outfile: String = Input::with_theme(&theme)
        .with_prompt("Output epub file")
        .default(defaults.epub.outfile.display().to_string())
        .interact()?;
    let mut outfile = PathBuf::from(outfile);
    let ext = outfile
        .extension()
        .map(std::ffi::OsStr::to_ascii_lowercase)
        .unwrap_or_default();
    if ext != *"epub" {
        outfile.set_extension("epub");
    }

    let stylesheet: String = Input::with_theme(&theme)
        .with_prompt("Custom CSS file (leave empty for the built-in stylesheet)")
        .allow_empty(true)
        .interact()?;

    let config = Configuration {
        summary,
        epub: EPUB {
            outfile,
            stylesheet: stylesheet.trim().to_string(),
            metadata: Metadata {
                identifier,
                title,
                author,
                language,
                description: description.trim().to_string(),
                toc_title,
                ..Metadata::default()
            },
        },
    };

    let config =
        toml::to_string_pretty(&config).with_context(|| "Failed to convert configuration to TOML")?;

    if path.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!(
                "{} already exists, do you want to override it?",
                path.display()
            ))
            .interact()?
    {
        println!("Configuration:");
        println!("{}", config);
    } else {
        std::fs::write(path, config).with_context(|| "Failed to write configuration file")?;
        println!("{} written!", path.display());
    }

    Ok(())
}
