//! Saving downloads to disk.
//!
//! Writes are atomic: the bytes go to a sibling temporary file which is then
//! renamed over the destination, so a reader never sees a half-written PDF.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::debug;

use super::{Download, format_file_size};
use crate::error::{PdfBinderError, Result};

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Capacity of the buffered file writer.
const BUFFER_SIZE: usize = 8192;

/// Writes downloads to the filesystem.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter;

impl PdfWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }

    /// Save to an explicit path.
    ///
    /// # Errors
    ///
    /// `FailedToWrite` when the temporary file cannot be created or written,
    /// or the final rename fails. The temporary file is removed on failure.
    pub async fn save(&self, download: &Download, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let bytes = download.shared_bytes();

        let stats = task::spawn_blocking(move || {
            let start = Instant::now();
            let temp_path = temp_path_for(&path_buf);

            let written = write_file(&temp_path, &bytes).and_then(|()| {
                std::fs::rename(&temp_path, &path_buf).map_err(|e| {
                    PdfBinderError::FailedToWrite {
                        path: path_buf.clone(),
                        source: e,
                    }
                })
            });

            if let Err(err) = written {
                let _ = std::fs::remove_file(&temp_path);
                return Err(err);
            }

            let file_size = std::fs::metadata(&path_buf)
                .map(|m| m.len())
                .unwrap_or(bytes.len() as u64);

            Ok::<_, PdfBinderError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PdfBinderError::collaborator(format!("Write task failed: {e}")))??;

        debug!(
            path = %stats.output_path.display(),
            size = %stats.format_file_size(),
            "Saved PDF"
        );
        Ok(stats)
    }

    /// Save into `dir` under the download's suggested filename.
    pub async fn save_in(&self, download: &Download, dir: &Path) -> Result<WriteStatistics> {
        self.save(download, &dir.join(download.filename())).await
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.pdf".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let to_error = |source| PdfBinderError::FailedToWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(to_error)?;
    let mut writer = std::io::BufWriter::with_capacity(BUFFER_SIZE, file);
    writer.write_all(bytes).map_err(to_error)?;
    writer.flush().map_err(to_error)?;
    Ok(())
}
