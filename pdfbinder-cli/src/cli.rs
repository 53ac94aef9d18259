//! CLI argument parsing for pdfbinder.
//!
//! This module defines the command-line interface structure using `clap`.
//! It is also compiled by `build.rs` to render the man page, so it only
//! depends on `clap` and the `pdfbinder` library.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pdfbinder::config::{CompressionLevel, Config, Metadata, OverwriteMode, PageSize};
use pdfbinder::error::Result;

/// Merge PDFs, or make a PDF from text or images.
#[derive(Parser, Debug)]
#[command(name = "pdfbinder")]
#[command(version)]
#[command(about = "Merge PDFs, or make a PDF from text or images", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Load settings from a JSON file
    ///
    /// Command-line flags override values from the file.
    #[arg(long, value_name = "FILE", global = true, env = "PDFBINDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Font size for text pages, in points
    #[arg(long, value_name = "PT", global = true)]
    pub font_size: Option<f32>,

    /// Size of blank pages: letter, a4, legal or WIDTHxHEIGHT in points
    #[arg(long, value_name = "SIZE", global = true)]
    pub page_size: Option<String>,

    /// Compression level for the output PDF
    ///
    /// - none: No compression
    /// - standard: Compress content streams (default)
    /// - maximum: Also drop unreachable objects
    #[arg(short, long, value_name = "LEVEL", global = true)]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,

    /// Set title metadata for the output PDF
    #[arg(long, value_name = "TEXT", global = true)]
    pub title: Option<String>,

    /// Set author metadata for the output PDF
    #[arg(long, value_name = "TEXT", global = true)]
    pub author: Option<String>,

    /// Set subject metadata for the output PDF
    #[arg(long, value_name = "TEXT", global = true)]
    pub subject: Option<String>,

    /// Set keywords metadata for the output PDF (comma-separated)
    #[arg(long, value_name = "TEXT", global = true)]
    pub keywords: Option<String>,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force", global = true)]
    pub no_clobber: bool,

    /// Verbose output
    ///
    /// Shows run statistics and debug logs.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,
}

/// What to build.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge two or more PDFs into one
    ///
    /// Files are merged in the order given. --sort is applied first, then
    /// each --move, then the --remove positions.
    ///
    /// Example:
    ///   pdfbinder merge intro.pdf body.pdf --move 2:1 -o book.pdf
    Merge(MergeArgs),

    /// Write text onto a single page
    ///
    /// Example:
    ///   pdfbinder text "Meeting moved to 3pm" -o note.pdf
    Text(TextArgs),

    /// Place each JPEG or PNG on its own page
    ///
    /// Other image types are skipped.
    Images(ImagesArgs),

    /// Interactive session
    Shell,
}

/// Arguments of `merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input PDF files
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Sort before merging: name-asc, name-desc or date
    #[arg(short, long, value_name = "KEY")]
    pub sort: Option<String>,

    /// Move the file at position FROM to position TO (1-based)
    #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
    pub moves: Vec<(usize, usize)>,

    /// Drop the file at position N (1-based)
    #[arg(long, value_name = "N", value_parser = parse_position)]
    pub remove: Vec<usize>,

    /// Output path [default: merged.pdf]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments of `text`.
#[derive(Args, Debug)]
pub struct TextArgs {
    /// Text to write
    #[arg(value_name = "TEXT", required_unless_present = "from_file")]
    pub text: Option<String>,

    /// Read the text from a file ('-' for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "text")]
    pub from_file: Option<PathBuf>,

    /// Output path [default: text.pdf]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments of `images`.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// Input images
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output path [default: images.pdf]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl Command {
    /// Explicit output path, if the subcommand has one.
    pub fn output(&self) -> Option<&Path> {
        match self {
            Self::Merge(args) => args.output.as_deref(),
            Self::Text(args) => args.output.as_deref(),
            Self::Images(args) => args.output.as_deref(),
            Self::Shell => None,
        }
    }
}

impl GlobalArgs {
    /// Build the configuration: file values first, then flags on top.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - Compression level or page size is invalid
    /// - The resulting configuration fails validation
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(size) = self.font_size {
            config.maker.font_size = size;
        }

        if let Some(ref page_size) = self.page_size {
            config.maker.page_size = PageSize::from_str(page_size)?;
        }

        if let Some(ref compression) = self.compression {
            config.compression = CompressionLevel::from_str(compression)?;
        }

        let flags = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );
        config.metadata = flags.or(config.metadata);

        if self.force {
            config.overwrite_mode = OverwriteMode::Force;
        } else if self.no_clobber {
            config.overwrite_mode = OverwriteMode::NoClobber;
        }

        config.verbose |= self.verbose;
        config.quiet |= self.quiet;
        if self.verbose {
            config.quiet = false;
        } else if self.quiet {
            config.verbose = false;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Cli {
    /// Configuration for this invocation, with the subcommand's output path.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = self.global.to_config()?;
        if let Some(output) = self.command.output() {
            config.output = Some(output.to_path_buf());
        }
        Ok(config)
    }
}

/// Parse a 1-based position into a 0-based index.
pub fn parse_position(s: &str) -> std::result::Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("'{s}' is not a position (1, 2, 3, ...)")),
    }
}

/// Parse `FROM:TO` (1-based) into 0-based indices.
pub fn parse_move(s: &str) -> std::result::Result<(usize, usize), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("'{s}' is not FROM:TO"))?;
    Ok((parse_position(from)?, parse_position(to)?))
}
