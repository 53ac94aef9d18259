//! Shared helpers for the integration tests.
//!
//! Fixtures are generated in memory: PDFs with `lopdf`, images with `image`.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Document, Object, dictionary};
use pdfbinder::RawInput;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Build a PDF with one page per entry of `widths`. Each page's MediaBox is
/// `widths[i]` × 792, which lets tests identify pages after a merge.
pub fn pdf_with_page_widths(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for width in widths {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), 792.into()],
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(Object::Reference).collect::<Vec<Object>>(),
            "Count" => widths.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize fixture");
    bytes
}

/// Page widths of a serialized PDF, in page order.
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).expect("Output is not a readable PDF");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            match &media_box[2] {
                Object::Integer(i) => *i,
                Object::Real(r) => r.round() as i64,
                other => panic!("unexpected MediaBox entry {other:?}"),
            }
        })
        .collect()
}

/// Number of pages of a serialized PDF.
pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes)
        .expect("Output is not a readable PDF")
        .get_pages()
        .len()
}

/// A solid-color PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([20, 40, 60, 255]))),
        ImageFormat::Png,
    )
}

/// A solid-color JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 120, 40]))),
        ImageFormat::Jpeg,
    )
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Failed to encode image fixture");
    bytes
}

/// In-memory PDF input.
pub fn pdf_input(name: &str, widths: &[i64]) -> RawInput {
    RawInput::from_bytes(name, "application/pdf", 0, pdf_with_page_widths(widths))
}

/// In-memory input with an explicit MIME type.
pub fn input(name: &str, mime: &str, bytes: Vec<u8>) -> RawInput {
    RawInput::from_bytes(name, mime, 0, bytes)
}

/// Write a fixture file and return its path.
pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}
