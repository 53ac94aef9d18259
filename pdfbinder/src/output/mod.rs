//! Output delivery.
//!
//! A finished [`AssemblyResult`] is offered to the user as a [`Download`]:
//! the bytes, a suggested filename and the PDF MIME type. [`PdfWriter`]
//! performs the one-shot save to disk.
//!
//! # Examples
//!
//! ```no_run
//! use pdfbinder::output::PdfWriter;
//! use pdfbinder::Session;
//! use std::path::Path;
//!
//! # async fn example(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
//! let download = session.download()?;
//! let stats = PdfWriter::new().save_in(&download, Path::new(".")).await?;
//! println!("Saved {}", stats.output_path.display());
//! # Ok(())
//! # }
//! ```

pub mod writer;

pub use writer::{PdfWriter, WriteStatistics};

use std::sync::Arc;

use crate::assembly::AssemblyResult;
use crate::item::PDF_MIME;

/// A result packaged for saving.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    filename: &'static str,
    bytes: Arc<[u8]>,
}

impl Download {
    /// Offer a result under its suggested filename.
    pub fn from_result(result: &AssemblyResult) -> Self {
        Self {
            filename: result.kind().suggested_filename(),
            bytes: result.shared_bytes(),
        }
    }

    /// Suggested filename.
    pub fn filename(&self) -> &'static str {
        self.filename
    }

    /// Always `application/pdf`.
    pub fn mime(&self) -> &'static str {
        PDF_MIME
    }

    /// The document.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::AssemblyKind;

    #[test]
    fn test_download_from_result() {
        let result = AssemblyResult::new(AssemblyKind::Images, b"%PDF-1.7".to_vec(), 1, 1);
        let download = Download::from_result(&result);

        assert_eq!(download.filename(), "images.pdf");
        assert_eq!(download.mime(), "application/pdf");
        assert_eq!(download.bytes(), b"%PDF-1.7");
        assert_eq!(download.len(), 8);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(100), "100 bytes");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_file_size(1536 * 1024), "1.50 MB");
    }
}
