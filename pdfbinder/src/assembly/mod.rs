//! Assembly pipeline.
//!
//! A run turns a snapshot of the stores into one finished PDF. Three kinds
//! exist: merging PDFs, writing text onto a page, and placing images on
//! pages. Runs are prepared by the [`Session`](crate::Session) as an
//! [`AssemblyJob`], executed with [`AssemblyJob::run`] without any access to
//! the session, and handed back with [`Session::complete`](crate::Session::complete).

pub mod images;
pub mod merge;
pub mod text;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::backend::PdfBackend;
use crate::config::MakerOptions;
use crate::error::Result;
use crate::item::InputItem;

pub use images::images_to_pdf;
pub use merge::merge_items;
pub use text::text_to_pdf;

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssemblyKind {
    /// Merged PDFs.
    Merge,
    /// Text page.
    Text,
    /// Image pages.
    Images,
}

impl AssemblyKind {
    /// Filename offered for download.
    pub fn suggested_filename(&self) -> &'static str {
        match self {
            Self::Merge => "merged.pdf",
            Self::Text => "text.pdf",
            Self::Images => "images.pdf",
        }
    }
}

impl fmt::Display for AssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge",
            Self::Text => "text",
            Self::Images => "images",
        })
    }
}

/// A finished document.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyResult {
    kind: AssemblyKind,
    bytes: Arc<[u8]>,
    page_count: usize,
    inputs: usize,
    duration: Duration,
}

impl AssemblyResult {
    /// Wrap serialized output.
    pub fn new(kind: AssemblyKind, bytes: Vec<u8>, page_count: usize, inputs: usize) -> Self {
        Self {
            kind,
            bytes: Arc::from(bytes),
            page_count,
            inputs,
            duration: Duration::ZERO,
        }
    }

    fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Kind of run that produced this result.
    pub fn kind(&self) -> AssemblyKind {
        self.kind
    }

    /// Serialized PDF.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the serialized PDF.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Number of pages in the output.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Number of store items the run consumed.
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Wall time of the run.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Size of the output in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Identifies one run of a session.
///
/// A ticket issued before a reset no longer matches the session and its
/// outcome is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunTicket {
    pub(crate) generation: u64,
    pub(crate) run: u64,
}

#[derive(Debug)]
enum Work {
    Merge(Vec<InputItem>),
    Text {
        text: String,
        options: MakerOptions,
    },
    Images {
        items: Vec<InputItem>,
        options: MakerOptions,
    },
}

/// A prepared run: an input snapshot plus the ticket to hand back.
#[derive(Debug)]
pub struct AssemblyJob {
    ticket: RunTicket,
    work: Work,
}

impl AssemblyJob {
    pub(crate) fn merge(ticket: RunTicket, items: Vec<InputItem>) -> Self {
        Self {
            ticket,
            work: Work::Merge(items),
        }
    }

    pub(crate) fn text(ticket: RunTicket, text: String, options: MakerOptions) -> Self {
        Self {
            ticket,
            work: Work::Text { text, options },
        }
    }

    pub(crate) fn images(ticket: RunTicket, items: Vec<InputItem>, options: MakerOptions) -> Self {
        Self {
            ticket,
            work: Work::Images { items, options },
        }
    }

    /// Ticket to pass to [`Session::complete`](crate::Session::complete).
    pub fn ticket(&self) -> RunTicket {
        self.ticket
    }

    /// Kind of output this job produces.
    pub fn kind(&self) -> AssemblyKind {
        match self.work {
            Work::Merge(_) => AssemblyKind::Merge,
            Work::Text { .. } => AssemblyKind::Text,
            Work::Images { .. } => AssemblyKind::Images,
        }
    }

    /// Execute the run. Items are processed strictly in order and any
    /// failure aborts the whole run.
    pub async fn run<B: PdfBackend>(self, backend: &B) -> Result<AssemblyResult> {
        let kind = self.kind();
        let start = Instant::now();
        info!(%kind, "Assembly started");

        let outcome = match self.work {
            Work::Merge(items) => merge_items(backend, &items).await,
            Work::Text { text, options } => text_to_pdf(backend, &text, &options),
            Work::Images { items, options } => images_to_pdf(backend, &items, &options).await,
        };

        match outcome {
            Ok(result) => {
                let result = result.with_duration(start.elapsed());
                info!(
                    %kind,
                    pages = result.page_count(),
                    bytes = result.size(),
                    elapsed_ms = result.duration().as_millis() as u64,
                    "Assembly finished"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(%kind, error = %err, "Assembly failed");
                Err(err)
            }
        }
    }
}
