//! Text to PDF.

use super::{AssemblyKind, AssemblyResult};
use crate::backend::{PdfBackend, TextOptions};
use crate::config::MakerOptions;
use crate::error::{PdfBinderError, Result};

/// Lay `text` out on a single page.
///
/// Surrounding whitespace is trimmed. The text starts `margin` points from
/// the top-left corner; explicit line breaks are honored, nothing wraps and
/// nothing spills onto a second page.
pub fn text_to_pdf<B: PdfBackend>(
    backend: &B,
    text: &str,
    options: &MakerOptions,
) -> Result<AssemblyResult> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PdfBinderError::EmptyInput { what: "text" });
    }

    let mut doc = backend.create_document()?;
    let page = backend.add_page(&mut doc, None, options.page_size)?;
    let size = backend.page_size(&doc, page)?;

    backend.draw_text(
        &mut doc,
        page,
        text,
        TextOptions {
            x: options.margin,
            y: size.height - options.margin,
            size: options.font_size,
        },
    )?;

    let page_count = backend.page_count(&doc);
    let bytes = backend.serialize(doc)?;

    Ok(AssemblyResult::new(AssemblyKind::Text, bytes, page_count, 0))
}
