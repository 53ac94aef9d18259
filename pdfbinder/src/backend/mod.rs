//! PDF construction backend.
//!
//! The assembly pipeline never touches PDF internals directly. It drives a
//! [`PdfBackend`], which knows how to parse documents, copy pages, draw text
//! and embed images. [`LopdfBackend`] is the implementation shipped with the
//! crate.

pub mod engine;
pub mod metadata;

pub use engine::{LopdfBackend, LopdfDocument, LopdfImage};
pub use metadata::MetadataStamp;

use crate::config::PageSize;
use crate::error::Result;

/// Where and how large to draw text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Left edge of the first line.
    pub x: f32,
    /// Baseline of the first line.
    pub y: f32,
    /// Font size in points.
    pub size: f32,
}

/// Where and how large to draw an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    /// Left edge.
    pub x: f32,
    /// Bottom edge.
    pub y: f32,
    /// Drawn width.
    pub width: f32,
    /// Drawn height.
    pub height: f32,
}

/// An image embedded in a document.
pub trait EmbeddedImage {
    /// Intrinsic size of the image, in pixels.
    fn dimensions(&self) -> (f32, f32);

    /// Size of the image scaled by `factor`.
    fn scale(&self, factor: f32) -> (f32, f32) {
        let (width, height) = self.dimensions();
        (width * factor, height * factor)
    }
}

/// Operations the assembly pipeline needs from a PDF library.
///
/// Pages are addressed by opaque handles owned by the document they were
/// added to. Page indices returned by [`page_indices`](Self::page_indices)
/// are zero-based and in document order.
pub trait PdfBackend {
    /// A document under construction or loaded from bytes.
    type Document;
    /// Handle to a page of a document.
    type Page: Copy;
    /// Handle to an embedded image.
    type Image: EmbeddedImage;

    /// New document with no pages.
    fn create_document(&self) -> Result<Self::Document>;

    /// Parse a document. `name` is used for error messages.
    ///
    /// # Errors
    ///
    /// [`PdfBinderError::Parse`](crate::PdfBinderError::Parse) when the
    /// bytes are not a readable PDF.
    fn load_document(&self, name: &str, bytes: &[u8]) -> Result<Self::Document>;

    /// Zero-based indices of every page, in order.
    fn page_indices(&self, doc: &Self::Document) -> Vec<usize>;

    /// Copy pages of `source` into `target`. The returned handles belong to
    /// `target` but are not part of its page sequence until passed to
    /// [`add_page`](Self::add_page).
    fn copy_pages(
        &self,
        target: &mut Self::Document,
        source: &Self::Document,
        indices: &[usize],
    ) -> Result<Vec<Self::Page>>;

    /// Append a page: the given copied page, or a blank page of `size`.
    fn add_page(
        &self,
        doc: &mut Self::Document,
        page: Option<Self::Page>,
        size: PageSize,
    ) -> Result<Self::Page>;

    /// Media box size of a page.
    fn page_size(&self, doc: &Self::Document, page: Self::Page) -> Result<PageSize>;

    /// Draw `text` on `page` in a single text object.
    fn draw_text(
        &self,
        doc: &mut Self::Document,
        page: Self::Page,
        text: &str,
        options: TextOptions,
    ) -> Result<()>;

    /// Embed JPEG bytes.
    fn embed_jpeg(&self, doc: &mut Self::Document, bytes: &[u8]) -> Result<Self::Image>;

    /// Embed PNG bytes.
    fn embed_png(&self, doc: &mut Self::Document, bytes: &[u8]) -> Result<Self::Image>;

    /// Draw an embedded image on `page`.
    fn draw_image(
        &self,
        doc: &mut Self::Document,
        page: Self::Page,
        image: &Self::Image,
        placement: ImagePlacement,
    ) -> Result<()>;

    /// Number of pages in the document's page sequence.
    fn page_count(&self, doc: &Self::Document) -> usize;

    /// Finish the document and produce its bytes.
    fn serialize(&self, doc: Self::Document) -> Result<Vec<u8>>;
}
