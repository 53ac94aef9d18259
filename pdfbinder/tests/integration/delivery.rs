//! Integration tests for saving results and configuration.

use lopdf::content::Content;
use lopdf::{Document, Object};
use pdfbinder::config::{CompressionLevel, Metadata};
use pdfbinder::output::PdfWriter;
use pdfbinder::{Config, LopdfBackend, Mode, PageSize, PdfBinderError, Session};
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{page_count, pdf_input};

#[tokio::test]
async fn test_save_merged_result() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = Session::default();
    session
        .add_files([pdf_input("a.pdf", &[100]), pdf_input("b.pdf", &[200])])
        .unwrap();
    session.merge(&LopdfBackend::default()).await.unwrap();

    let download = session.download().unwrap();
    assert_eq!(download.mime(), "application/pdf");

    let stats = PdfWriter::new()
        .save_in(&download, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(stats.output_path, temp_dir.path().join("merged.pdf"));
    let saved = std::fs::read(&stats.output_path).unwrap();
    assert_eq!(saved, download.bytes());
    assert_eq!(page_count(&saved), 2);
}

#[tokio::test]
async fn test_metadata_is_stamped() {
    let backend = LopdfBackend::new(
        CompressionLevel::Standard,
        Metadata::new(Some("Minutes".to_string()), Some("Clerk".to_string()), None, None),
    );
    let mut session = Session::default();
    session.switch_mode(Mode::Maker).unwrap();

    let result = session.create_text_pdf(&backend, "Agenda").await.unwrap();

    let doc = Document::load_mem(result.bytes()).unwrap();
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Minutes");
    assert_eq!(info.get(b"Author").unwrap().as_str().unwrap(), b"Clerk");
    assert!(info.has(b"Producer"));
    assert!(info.has(b"CreationDate"));
}

#[rstest]
#[case(CompressionLevel::None)]
#[case(CompressionLevel::Standard)]
#[case(CompressionLevel::Maximum)]
#[tokio::test]
async fn test_every_compression_level_produces_readable_output(
    #[case] compression: CompressionLevel,
) {
    let backend = LopdfBackend::new(compression, Metadata::default());
    let mut session = Session::default();
    session
        .add_files([pdf_input("a.pdf", &[100, 150]), pdf_input("b.pdf", &[200])])
        .unwrap();

    let result = session.merge(&backend).await.unwrap();
    assert_eq!(page_count(result.bytes()), 3);
}

#[tokio::test]
async fn test_config_file_drives_text_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pdfbinder.json");
    std::fs::write(
        &path,
        r#"{ "maker": { "page_size": "a4", "font_size": 18 }, "compression": "none" }"#,
    )
    .unwrap();

    let config = Config::from_json_file(&path).unwrap();
    assert_eq!(config.maker.page_size, PageSize::A4);

    let mut session = Session::new(&config);
    session.switch_mode(Mode::Maker).unwrap();
    let result = session
        .create_text_pdf(&LopdfBackend::from_config(&config), "Sized")
        .await
        .unwrap();

    let doc = Document::load_mem(result.bytes()).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let font = content
        .operations
        .iter()
        .find(|op| op.operator == "Tf")
        .expect("text has no font operator");
    let size = match font.operands[1] {
        Object::Integer(size) => size as f32,
        Object::Real(size) => size as f32,
        ref other => panic!("unexpected font size operand {other:?}"),
    };
    assert_eq!(size, 18.0);
}

#[tokio::test]
async fn test_download_before_any_run() {
    let session = Session::default();
    assert!(matches!(
        session.download(),
        Err(PdfBinderError::InvalidState { .. })
    ));
}
