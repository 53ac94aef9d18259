//! [`PdfBackend`] implemented on top of `lopdf`.

use std::io::Cursor;
use std::time::SystemTime;

use image::codecs::jpeg::JpegDecoder;
use image::{GenericImageView, ImageDecoder, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, trace};

use super::{EmbeddedImage, ImagePlacement, MetadataStamp, PdfBackend, TextOptions};
use crate::config::{CompressionLevel, Config, Metadata, PageSize};
use crate::error::{PdfBinderError, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// A document plus the bookkeeping needed to keep adding to it.
#[derive(Debug, Clone)]
pub struct LopdfDocument {
    doc: Document,
    pages_id: ObjectId,
    font_id: Option<ObjectId>,
}

impl LopdfDocument {
    /// Borrow the underlying document.
    pub fn inner(&self) -> &Document {
        &self.doc
    }

    fn catalog_pages(doc: &Document) -> Option<ObjectId> {
        doc.catalog()
            .ok()?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .ok()
    }
}

/// An image XObject embedded in a [`LopdfDocument`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LopdfImage {
    id: ObjectId,
    width: u32,
    height: u32,
}

impl LopdfImage {
    /// Object id of the XObject.
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl EmbeddedImage for LopdfImage {
    fn dimensions(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }
}

/// The default backend.
#[derive(Debug, Clone, Default)]
pub struct LopdfBackend {
    compression: CompressionLevel,
    stamp: MetadataStamp,
}

impl LopdfBackend {
    /// Backend with explicit output settings.
    pub fn new(compression: CompressionLevel, metadata: Metadata) -> Self {
        Self {
            compression,
            stamp: MetadataStamp::new(metadata),
        }
    }

    /// Backend configured from a [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.compression, config.metadata.clone())
    }
}

impl PdfBackend for LopdfBackend {
    type Document = LopdfDocument;
    type Page = ObjectId;
    type Image = LopdfImage;

    fn create_document(&self) -> Result<LopdfDocument> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(LopdfDocument {
            doc,
            pages_id,
            font_id: None,
        })
    }

    fn load_document(&self, name: &str, bytes: &[u8]) -> Result<LopdfDocument> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| PdfBinderError::parse(name, e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfBinderError::parse(name, "document is encrypted"));
        }

        let pages_id = LopdfDocument::catalog_pages(&doc)
            .ok_or_else(|| PdfBinderError::parse(name, "missing page tree"))?;

        debug!(name, pages = doc.get_pages().len(), "Loaded PDF");

        Ok(LopdfDocument {
            doc,
            pages_id,
            font_id: None,
        })
    }

    fn page_indices(&self, doc: &LopdfDocument) -> Vec<usize> {
        (0..doc.doc.get_pages().len()).collect()
    }

    fn copy_pages(
        &self,
        target: &mut LopdfDocument,
        source: &LopdfDocument,
        indices: &[usize],
    ) -> Result<Vec<ObjectId>> {
        // Renumber a private copy so its ids cannot collide with the target.
        let mut source = source.doc.clone();
        source.renumber_objects_with(target.doc.max_id + 1);

        let pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let mut copied = Vec::with_capacity(indices.len());

        for &index in indices {
            let page_id = *pages.get(index).ok_or_else(|| {
                PdfBinderError::collaborator(format!(
                    "page {index} out of range, document has {} pages",
                    pages.len()
                ))
            })?;

            let page = flatten_page(&source, page_id)?;
            let page = Object::Dictionary(page);
            target.doc.objects.insert(page_id, page.clone());
            copy_references(&mut target.doc, &source, &page);
            copied.push(page_id);
        }

        target.doc.max_id = target.doc.max_id.max(source.max_id);
        trace!(count = copied.len(), "Copied pages");

        Ok(copied)
    }

    fn add_page(
        &self,
        doc: &mut LopdfDocument,
        page: Option<ObjectId>,
        size: PageSize,
    ) -> Result<ObjectId> {
        let pages_id = doc.pages_id;

        let page_id = match page {
            Some(id) => {
                doc.doc.get_dictionary_mut(id)?.set("Parent", pages_id);
                id
            }
            None => doc.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(size.width),
                    Object::Real(size.height),
                ],
                "Resources" => Dictionary::new(),
            }),
        };

        let pages = doc.doc.get_dictionary_mut(pages_id)?;
        pages
            .get_mut(b"Kids")?
            .as_array_mut()?
            .push(Object::Reference(page_id));
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages.set("Count", count + 1);

        Ok(page_id)
    }

    fn page_size(&self, doc: &LopdfDocument, page: ObjectId) -> Result<PageSize> {
        let page = flatten_page(&doc.doc, page)?;
        let media_box = page.get(b"MediaBox")?.as_array()?;

        let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
        match coords.as_slice() {
            [x0, y0, x1, y1] => Ok(PageSize::new((x1 - x0).abs(), (y1 - y0).abs())),
            _ => Err(PdfBinderError::collaborator("malformed MediaBox")),
        }
    }

    fn draw_text(
        &self,
        doc: &mut LopdfDocument,
        page: ObjectId,
        text: &str,
        options: TextOptions,
    ) -> Result<()> {
        let encoded = encode_win_ansi(text)?;
        let font_id = match doc.font_id {
            Some(id) => id,
            None => {
                let id = doc.doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                });
                doc.font_id = Some(id);
                id
            }
        };
        let font = add_resource(&mut doc.doc, page, "Font", "F", font_id)?;

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.into_bytes()), Object::Real(options.size)],
            ),
            Operation::new("TL", vec![Object::Real(options.size * LINE_HEIGHT)]),
            Operation::new("Td", vec![Object::Real(options.x), Object::Real(options.y)]),
        ];
        for (i, line) in encoded.into_iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(line, StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        append_content(&mut doc.doc, page, Content { operations })
    }

    fn embed_jpeg(&self, doc: &mut LopdfDocument, bytes: &[u8]) -> Result<LopdfImage> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))?;
        let (width, height) = decoder.dimensions();

        // The decoder reports CMYK as RGB, so the frame header decides.
        let header = read_jpeg_header(bytes)
            .ok_or_else(|| PdfBinderError::collaborator("JPEG has no frame header"))?;
        let color_space = match header.components {
            1 => "DeviceGray",
            3 => "DeviceRGB",
            4 => "DeviceCMYK",
            n => {
                return Err(PdfBinderError::collaborator(format!(
                    "unsupported JPEG with {n} color components"
                )));
            }
        };

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        // Adobe writers store CMYK inverted.
        if header.components == 4 && header.adobe {
            let decode = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec();
            dict.set("Decode", decode);
        }

        // Already DCT-compressed; embed the file as-is.
        let stream = Stream::new(dict, bytes.to_vec()).with_compression(false);

        let id = doc.doc.add_object(stream);
        Ok(LopdfImage { id, width, height })
    }

    fn embed_png(&self, doc: &mut LopdfDocument, bytes: &[u8]) -> Result<LopdfImage> {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        let (width, height) = decoded.dimensions();
        let rgba = decoded.to_rgba8();

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        let mut alpha = Vec::with_capacity(width as usize * height as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };

        if alpha.iter().any(|&a| a != u8::MAX) {
            let mut mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            );
            if let Err(err) = mask.compress() {
                debug!(%err, "Leaving image mask uncompressed");
            }
            dict.set("SMask", doc.doc.add_object(mask));
        }

        let mut stream = Stream::new(dict, rgb);
        if let Err(err) = stream.compress() {
            debug!(%err, "Leaving image pixels uncompressed");
        }

        let id = doc.doc.add_object(stream);
        Ok(LopdfImage { id, width, height })
    }

    fn draw_image(
        &self,
        doc: &mut LopdfDocument,
        page: ObjectId,
        image: &LopdfImage,
        placement: ImagePlacement,
    ) -> Result<()> {
        let name = add_resource(&mut doc.doc, page, "XObject", "Im", image.id)?;

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width),
                    0.into(),
                    0.into(),
                    Object::Real(placement.height),
                    Object::Real(placement.x),
                    Object::Real(placement.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ];

        append_content(&mut doc.doc, page, Content { operations })
    }

    fn page_count(&self, doc: &LopdfDocument) -> usize {
        doc.doc.get_pages().len()
    }

    fn serialize(&self, doc: LopdfDocument) -> Result<Vec<u8>> {
        let mut doc = doc.doc;
        self.stamp.apply(&mut doc, SystemTime::now())?;

        match self.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => doc.compress(),
            CompressionLevel::Maximum => {
                doc.compress();
                doc.prune_objects();
            }
        }
        doc.renumber_objects();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| PdfBinderError::collaborator(format!("Failed to save PDF: {e}")))?;

        debug!(bytes = bytes.len(), "Serialized PDF");
        Ok(bytes)
    }
}

/// Copy object references from one document to another.
///
/// Walks `obj` recursively and inserts every referenced object missing from
/// `target`. `source` must already be renumbered past `target`'s ids.
fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    match obj {
        Object::Reference(ref_id) => {
            if !target.objects.contains_key(ref_id)
                && let Ok(referenced) = source.get_object(*ref_id)
            {
                target.objects.insert(*ref_id, referenced.clone());
                copy_references(target, source, referenced);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                copy_references(target, source, value);
            }
        }
        Object::Array(items) => {
            for item in items {
                copy_references(target, source, item);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                copy_references(target, source, value);
            }
        }
        _ => {}
    }
}

/// Page dictionary with inherited attributes pulled in and `Parent` removed.
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node_id) = parent else { break };
        let node = doc.get_dictionary(node_id)?;
        for key in INHERITABLE {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key, value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Register `target` in the page's resource `category` under a fresh name
/// starting with `prefix`, returning the name.
fn add_resource(
    doc: &mut Document,
    page: ObjectId,
    category: &str,
    prefix: &str,
    target: ObjectId,
) -> Result<String> {
    let mut resources = resolve_dictionary(doc, doc.get_dictionary(page)?.get(b"Resources").ok())?;
    let mut entries = resolve_dictionary(doc, resources.get(category.as_bytes()).ok())?;

    let existing = entries
        .iter()
        .find(|(_, value)| value.as_reference().ok() == Some(target))
        .map(|(key, _)| String::from_utf8_lossy(key).into_owned());

    let name = match existing {
        Some(name) => name,
        None => {
            let name = (1..)
                .map(|n| format!("{prefix}{n}"))
                .find(|name| !entries.has(name.as_bytes()))
                .unwrap_or_else(|| prefix.to_string());
            entries.set(name.as_str(), target);
            name
        }
    };

    resources.set(category, entries);
    doc.get_dictionary_mut(page)?.set("Resources", resources);
    Ok(name)
}

fn resolve_dictionary(doc: &Document, obj: Option<&Object>) -> Result<Dictionary> {
    match obj {
        Some(Object::Reference(id)) => Ok(doc.get_dictionary(*id)?.clone()),
        Some(Object::Dictionary(dict)) => Ok(dict.clone()),
        _ => Ok(Dictionary::new()),
    }
}

/// Append a content stream to a page, keeping any existing ones.
fn append_content(doc: &mut Document, page: ObjectId, content: Content) -> Result<()> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
    let page = doc.get_dictionary_mut(page)?;

    let contents = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => Object::Array(vec![(*id).into(), stream_id.into()]),
        Ok(Object::Array(items)) => {
            let mut items = items.clone();
            items.push(stream_id.into());
            Object::Array(items)
        }
        _ => Object::Reference(stream_id),
    };
    page.set("Contents", contents);

    Ok(())
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Encode text for the standard Helvetica font, one byte string per line.
///
/// `\n` and `\r\n` start a new line and a tab becomes a space. Characters
/// outside Windows-1252 are rejected.
fn encode_win_ansi(text: &str) -> Result<Vec<Vec<u8>>> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| {
            line.chars()
                .map(|ch| {
                    win_ansi_byte(ch).ok_or_else(|| {
                        PdfBinderError::collaborator(format!(
                            "WinAnsi cannot encode {ch:?} (U+{:04X})",
                            ch as u32
                        ))
                    })
                })
                .collect()
        })
        .collect()
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\t' => b' ',
        ' '..='~' => ch as u8,
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// What a PDF needs to know about a JPEG beyond its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    components: u8,
    adobe: bool,
}

/// Walk the marker segments up to the first frame header.
fn read_jpeg_header(bytes: &[u8]) -> Option<JpegHeader> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut adobe = false;
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            0xFF => {
                pos += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }

        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let body = bytes.get(pos + 4..pos + 2 + len)?;
        match marker {
            0xEE if body.starts_with(b"Adobe") => adobe = true,
            0xC4 | 0xC8 | 0xCC => {}
            0xC0..=0xCF => {
                return Some(JpegHeader {
                    components: *body.get(5)?,
                    adobe,
                });
            }
            0xDA | 0xD9 => return None,
            _ => {}
        }
        pos += 2 + len;
    }
    None
}
