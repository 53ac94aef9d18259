//! Pending inputs.
//!
//! An [`InputItem`] is one unit of work waiting in a store: a PDF to merge or
//! an image to place on its own page. Items are built from [`RawInput`]
//! records handed over by the presentation layer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use crate::error::{PdfBinderError, Result};

/// MIME type of PDF documents.
pub const PDF_MIME: &str = "application/pdf";

/// Which inputs a store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `application/pdf` only.
    Pdf,
    /// Anything under `image/`.
    Image,
}

impl InputKind {
    /// Check a declared MIME type against this kind.
    pub fn accepts(&self, mime: &str) -> bool {
        match self {
            Self::Pdf => mime == PDF_MIME,
            Self::Image => mime.starts_with("image/"),
        }
    }

    /// Label used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "image",
        }
    }
}

/// Image codec as far as the makers care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeKind {
    /// `image/jpeg` or `image/jpg`.
    Jpeg,
    /// `image/png`.
    Png,
    /// Anything else; produces no page.
    Other,
}

impl MimeKind {
    /// Classify a declared MIME type.
    pub fn from_mime(mime: &str) -> Self {
        if mime.contains("jpeg") || mime.contains("jpg") {
            Self::Jpeg
        } else if mime.contains("png") {
            Self::Png
        } else {
            Self::Other
        }
    }
}

/// Guess a MIME type from a file name the way a browser file picker does.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("jpg" | "jpeg" | "jfif") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("tif" | "tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Raw bytes of an input.
#[derive(Clone)]
pub enum Payload {
    /// Bytes already in memory.
    Memory(Arc<[u8]>),
    /// Bytes read from disk when the pipeline needs them.
    File(PathBuf),
}

impl Payload {
    /// Read the payload. File-backed payloads suspend on `tokio::fs`.
    pub async fn read(&self, name: &str) -> Result<Arc<[u8]>> {
        match self {
            Self::Memory(bytes) => Ok(Arc::clone(bytes)),
            Self::File(path) => tokio::fs::read(path)
                .await
                .map(Arc::from)
                .map_err(|source| PdfBinderError::InputRead {
                    name: name.to_string(),
                    source,
                }),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            Self::File(path) => write!(f, "File({})", path.display()),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Memory(Arc::from(bytes))
    }
}

/// One input record as supplied by the presentation layer.
#[derive(Debug, Clone)]
pub struct RawInput {
    /// File name shown to the user.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub last_modified: i64,
    /// Declared MIME type.
    pub mime: String,
    /// The bytes.
    pub payload: Payload,
}

impl RawInput {
    /// Build an in-memory input. Size is taken from the bytes.
    pub fn from_bytes(
        name: impl Into<String>,
        mime: impl Into<String>,
        last_modified: i64,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            last_modified,
            mime: mime.into(),
            payload: Payload::from(bytes),
        }
    }

    /// Describe a file on disk without reading it.
    ///
    /// Size and modification time come from the filesystem; the MIME type is
    /// guessed from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|source| PdfBinderError::InputRead {
                    name: name.clone(),
                    source,
                })?;

        if !metadata.is_file() {
            return Err(PdfBinderError::InputRead {
                name,
                source: std::io::Error::other("not a regular file"),
            });
        }

        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        Ok(Self {
            mime: mime_from_name(&name).to_string(),
            name,
            size: metadata.len(),
            last_modified,
            payload: Payload::File(path.to_path_buf()),
        })
    }
}

/// Identity used for deduplication and date sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemIdentity {
    name: String,
    size: u64,
    /// Milliseconds since the Unix epoch.
    last_modified: i64,
}

/// A pending unit of work held by a store.
#[derive(Debug, Clone)]
pub struct InputItem {
    identity: ItemIdentity,
    mime: String,
    kind: MimeKind,
    payload: Payload,
}

impl InputItem {
    /// Name of the item.
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.identity.size
    }

    /// Last modification time in milliseconds.
    pub fn last_modified(&self) -> i64 {
        self.identity.last_modified
    }

    /// Declared MIME type.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Codec classification of the MIME type.
    pub fn mime_kind(&self) -> MimeKind {
        self.kind
    }

    /// Two items are duplicates when name and size match. The timestamp is
    /// deliberately ignored.
    pub fn is_duplicate_of(&self, other: &InputItem) -> bool {
        self.identity.name == other.identity.name && self.identity.size == other.identity.size
    }

    /// Read the raw bytes.
    pub async fn bytes(&self) -> Result<Arc<[u8]>> {
        self.payload.read(&self.identity.name).await
    }
}

impl From<RawInput> for InputItem {
    fn from(raw: RawInput) -> Self {
        Self {
            kind: MimeKind::from_mime(&raw.mime),
            identity: ItemIdentity {
                name: raw.name,
                size: raw.size,
                last_modified: raw.last_modified,
            },
            mime: raw.mime,
            payload: raw.payload,
        }
    }
}
