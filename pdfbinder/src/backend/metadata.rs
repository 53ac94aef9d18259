//! Document information dictionary.
//!
//! Every produced PDF is stamped with Producer/Creator and creation and
//! modification dates; title, author, subject and keywords are written when
//! configured.

use lopdf::{Dictionary, Document, Object, StringFormat};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Metadata;
use crate::error::{PdfBinderError, Result};

/// Info dictionary contents applied at serialization time.
#[derive(Debug, Clone)]
pub struct MetadataStamp {
    metadata: Metadata,
    producer: String,
}

impl Default for MetadataStamp {
    fn default() -> Self {
        Self::new(Metadata::default())
    }
}

impl MetadataStamp {
    /// Stamp with the crate name as producer.
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            producer: format!("{} {}", crate::NAME, crate::VERSION),
        }
    }

    /// User supplied fields.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Write the Info dictionary, creating it if needed.
    pub fn apply(&self, doc: &mut Document, now: SystemTime) -> Result<()> {
        let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
            Ok(id) if doc.get_dictionary(id).is_ok() => id,
            _ => {
                let id = doc.add_object(Dictionary::new());
                doc.trailer.set("Info", Object::Reference(id));
                id
            }
        };

        let info = doc.get_dictionary_mut(info_id).map_err(|e| {
            PdfBinderError::collaborator(format!("Failed to open Info dictionary: {e}"))
        })?;

        let fields = [
            ("Title", &self.metadata.title),
            ("Author", &self.metadata.author),
            ("Subject", &self.metadata.subject),
            ("Keywords", &self.metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text_string(value));
            }
        }

        info.set("Producer", text_string(&self.producer));
        info.set("Creator", text_string(&self.producer));

        let date = format_pdf_date(now);
        info.set("CreationDate", Object::string_literal(date.as_str()));
        info.set("ModDate", Object::string_literal(date.as_str()));

        Ok(())
    }
}

/// Read a text field back from the Info dictionary.
pub fn read_field(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    match info.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// PDF text string: PDFDocEncoding when the text is ASCII, UTF-16BE with a
/// byte order mark otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Format a SystemTime as a PDF date string in UTC.
///
/// PDF date format: D:YYYYMMDDHHmmSSZ
fn format_pdf_date(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    let days = secs.div_euclid(86_400);
    let time_of_day = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);

    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
        year,
        month,
        day,
        time_of_day / 3_600,
        (time_of_day % 3_600) / 60,
        time_of_day % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
