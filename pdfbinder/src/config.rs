//! Configuration module for pdfbinder.
//!
//! Settings that shape an assembly run and how its result is saved. A
//! [`Config`] starts from defaults, can be loaded from a JSON file, and is
//! then overridden by command-line flags. It handles:
//! - Page geometry and font size for the makers
//! - Output compression
//! - Document information written into the output
//! - Output overwrite behavior

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PdfBinderError, Result};

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - preserves exact structure.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress and drop unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = PdfBinderError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PdfBinderError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct PageSize {
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
}

impl PageSize {
    /// US Letter, the size blank pages get unless configured otherwise.
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    /// ISO A4.
    pub const A4: PageSize = PageSize::new(595.28, 841.89);
    /// US Legal.
    pub const LEGAL: PageSize = PageSize::new(612.0, 1008.0);

    /// Create a page size from explicit dimensions.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Grow this size so that a `width` × `height` box plus `margin` on every
    /// side fits. Never shrinks.
    pub fn fit(self, width: f32, height: f32, margin: f32) -> Self {
        Self {
            width: self.width.max(width + 2.0 * margin),
            height: self.height.max(height + 2.0 * margin),
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

impl FromStr for PageSize {
    type Err = PdfBinderError;

    /// Parse "letter", "a4", "legal" or an explicit "WIDTHxHEIGHT" in points.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "letter" => Ok(Self::LETTER),
            "a4" => Ok(Self::A4),
            "legal" => Ok(Self::LEGAL),
            other => {
                let invalid = || {
                    PdfBinderError::invalid_config(format!(
                        "Invalid page size: {s}. Use letter, a4, legal or WIDTHxHEIGHT"
                    ))
                };
                let (w, h) = other.split_once('x').ok_or_else(invalid)?;
                let width: f32 = w.trim().parse().map_err(|_| invalid())?;
                let height: f32 = h.trim().parse().map_err(|_| invalid())?;
                if width <= 0.0 || height <= 0.0 {
                    return Err(invalid());
                }
                Ok(Self::new(width, height))
            }
        }
    }
}

impl TryFrom<String> for PageSize {
    type Error = PdfBinderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Layout settings used by the text and image makers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MakerOptions {
    /// Font size for text pages.
    pub font_size: f32,
    /// Size of blank pages.
    pub page_size: PageSize,
    /// Distance from the top-left corner where content starts.
    pub margin: f32,
    /// Scale applied to an image's pixel dimensions when placing it.
    pub image_scale: f32,
}

impl Default for MakerOptions {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            page_size: PageSize::LETTER,
            margin: 50.0,
            image_scale: 0.5,
        }
    }
}

/// PDF metadata to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }

    /// Fill unset fields from `other`.
    pub fn or(self, other: Metadata) -> Self {
        Self {
            title: self.title.or(other.title),
            author: self.author.or(other.author),
            subject: self.subject.or(other.subject),
            keywords: self.keywords.or(other.keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Complete configuration for a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maker layout settings.
    pub maker: MakerOptions,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Metadata to set on output document.
    pub metadata: Metadata,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Explicit output path; the result's suggested filename otherwise.
    pub output: Option<PathBuf>,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| PdfBinderError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PdfBinderError::invalid_config(format!(
                "Cannot read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Verbose and quiet modes are both enabled
    /// - Font size, margin or image scale are not positive
    /// - Page dimensions are not positive
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            return Err(PdfBinderError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        let maker = &self.maker;
        if maker.font_size <= 0.0 {
            return Err(PdfBinderError::invalid_config(format!(
                "Font size must be positive, got {}",
                maker.font_size
            )));
        }

        if maker.margin < 0.0 {
            return Err(PdfBinderError::invalid_config(format!(
                "Margin cannot be negative, got {}",
                maker.margin
            )));
        }

        if maker.image_scale <= 0.0 {
            return Err(PdfBinderError::invalid_config(format!(
                "Image scale must be positive, got {}",
                maker.image_scale
            )));
        }

        if maker.page_size.width <= 0.0 || maker.page_size.height <= 0.0 {
            return Err(PdfBinderError::invalid_config("Page size must be positive"));
        }

        Ok(())
    }
}
