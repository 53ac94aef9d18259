//! Merge PDFs in store order.

use tracing::debug;

use super::{AssemblyKind, AssemblyResult};
use crate::backend::PdfBackend;
use crate::config::PageSize;
use crate::error::{PdfBinderError, Result};
use crate::item::InputItem;

/// Fewest documents a merge accepts.
pub const MIN_MERGE_INPUTS: usize = 2;

/// Concatenate every page of every item, in order.
///
/// # Errors
///
/// - `NotEnoughInputs` when fewer than two items are given.
/// - Any read, parse or backend error from a single item aborts the whole
///   merge; the partially built document is dropped.
pub async fn merge_items<B: PdfBackend>(backend: &B, items: &[InputItem]) -> Result<AssemblyResult> {
    if items.len() < MIN_MERGE_INPUTS {
        return Err(PdfBinderError::NotEnoughInputs {
            required: MIN_MERGE_INPUTS,
            actual: items.len(),
        });
    }

    let mut merged = backend.create_document()?;

    for item in items {
        let bytes = item.bytes().await?;
        let source = backend.load_document(item.name(), &bytes)?;
        let indices = backend.page_indices(&source);

        let pages = backend.copy_pages(&mut merged, &source, &indices)?;
        for page in pages {
            backend.add_page(&mut merged, Some(page), PageSize::default())?;
        }

        debug!(name = item.name(), pages = indices.len(), "Merged document");
    }

    let page_count = backend.page_count(&merged);
    let bytes = backend.serialize(merged)?;

    Ok(AssemblyResult::new(
        AssemblyKind::Merge,
        bytes,
        page_count,
        items.len(),
    ))
}
