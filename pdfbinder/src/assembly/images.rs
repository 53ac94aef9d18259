//! Images to PDF, one page per image.

use tracing::{debug, warn};

use super::{AssemblyKind, AssemblyResult};
use crate::backend::{EmbeddedImage, ImagePlacement, PdfBackend};
use crate::config::MakerOptions;
use crate::error::{PdfBinderError, Result};
use crate::item::{InputItem, MimeKind};

/// Place every JPEG and PNG on its own page, in order.
///
/// Images of any other type are skipped without error, so a batch made only
/// of unsupported images yields a document with no pages. Each page starts at
/// the configured size and grows when the scaled image plus margin would not
/// fit.
pub async fn images_to_pdf<B: PdfBackend>(
    backend: &B,
    items: &[InputItem],
    options: &MakerOptions,
) -> Result<AssemblyResult> {
    if items.is_empty() {
        return Err(PdfBinderError::EmptyInput { what: "images" });
    }

    let mut doc = backend.create_document()?;

    for item in items {
        let kind = item.mime_kind();
        if kind == MimeKind::Other {
            warn!(name = item.name(), mime = item.mime(), "Skipping unsupported image");
            continue;
        }

        let bytes = item.bytes().await?;
        let image = match kind {
            MimeKind::Jpeg => backend.embed_jpeg(&mut doc, &bytes)?,
            _ => backend.embed_png(&mut doc, &bytes)?,
        };

        let (width, height) = image.scale(options.image_scale);
        let size = options.page_size.fit(width, height, options.margin);
        let page = backend.add_page(&mut doc, None, size)?;

        backend.draw_image(
            &mut doc,
            page,
            &image,
            ImagePlacement {
                x: options.margin,
                y: size.height - height - options.margin,
                width,
                height,
            },
        )?;

        debug!(name = item.name(), width, height, "Placed image");
    }

    let page_count = backend.page_count(&doc);
    let bytes = backend.serialize(doc)?;

    Ok(AssemblyResult::new(
        AssemblyKind::Images,
        bytes,
        page_count,
        items.len(),
    ))
}
