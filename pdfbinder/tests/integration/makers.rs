//! Integration tests for the text and image makers.

use lopdf::Document;
use lopdf::content::Content;
use pdfbinder::config::{CompressionLevel, Metadata};
use pdfbinder::{
    AssemblyKind, Config, LopdfBackend, MakerTab, Mode, PdfBinderError, Session, ViewState,
};

use crate::common::{input, jpeg_bytes, page_count, png_bytes};

fn maker_session(tab: MakerTab) -> Session {
    let mut session = Session::default();
    session.switch_mode(Mode::Maker).unwrap();
    session.select_maker_tab(tab).unwrap();
    session
}

#[tokio::test]
async fn test_text_pdf_has_one_page() {
    let mut session = maker_session(MakerTab::Text);

    let result = session
        .create_text_pdf(&LopdfBackend::default(), "  First line\nSecond line  ")
        .await
        .unwrap();

    assert_eq!(result.kind(), AssemblyKind::Text);
    assert_eq!(page_count(result.bytes()), 1);
    assert_eq!(session.state(), ViewState::Ready);
    assert_eq!(session.download().unwrap().filename(), "text.pdf");
}

#[tokio::test]
async fn test_text_is_written_to_content_stream() {
    let backend = LopdfBackend::new(CompressionLevel::None, Metadata::default());
    let mut session = maker_session(MakerTab::Text);

    let result = session
        .create_text_pdf(&backend, "Hello pdfbinder")
        .await
        .unwrap();

    let doc = Document::load_mem(result.bytes()).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    let shown: Vec<&[u8]> = content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| op.operands.first()?.as_str().ok())
        .collect();
    assert_eq!(shown, vec![b"Hello pdfbinder".as_slice()]);
}

#[tokio::test]
async fn test_unencodable_text_fails_and_returns_to_tab() {
    let mut session = maker_session(MakerTab::Text);

    let err = session
        .create_text_pdf(&LopdfBackend::default(), "こんにちは")
        .await
        .unwrap_err();

    assert!(matches!(err, PdfBinderError::Collaborator { .. }));
    assert_eq!(session.state(), ViewState::MakerText);
    assert!(session.result().is_none());
}

#[tokio::test]
async fn test_image_pdf_one_page_per_supported_image() {
    let mut session = maker_session(MakerTab::Image);
    session
        .add_images([
            input("a.png", "image/png", png_bytes(40, 20)),
            input("b.gif", "image/gif", b"GIF89a".to_vec()),
            input("c.jpg", "image/jpeg", jpeg_bytes(30, 30)),
        ])
        .unwrap();

    let result = session
        .create_image_pdf(&LopdfBackend::default())
        .await
        .unwrap();

    assert_eq!(result.kind(), AssemblyKind::Images);
    assert_eq!(result.page_count(), 2);
    assert_eq!(page_count(result.bytes()), 2);
    assert_eq!(session.download().unwrap().filename(), "images.pdf");
}

#[tokio::test]
async fn test_png_and_gif_yield_single_page() {
    let mut session = maker_session(MakerTab::Image);
    session
        .add_images([
            input("a.png", "image/png", png_bytes(8, 8)),
            input("b.gif", "image/gif", b"GIF89a".to_vec()),
        ])
        .unwrap();

    let result = session
        .create_image_pdf(&LopdfBackend::default())
        .await
        .unwrap();
    assert_eq!(result.page_count(), 1);
}

#[tokio::test]
async fn test_large_image_grows_page() {
    let config = Config::default();
    let mut session = Session::new(&config);
    session.switch_mode(Mode::Maker).unwrap();
    session.select_maker_tab(MakerTab::Image).unwrap();
    session
        .add_images([input("wide.png", "image/png", png_bytes(2000, 100))])
        .unwrap();

    let result = session
        .create_image_pdf(&LopdfBackend::default())
        .await
        .unwrap();

    // 2000 px at half scale plus a 50 pt margin on both sides.
    let widths = crate::common::page_widths(result.bytes());
    assert_eq!(widths, vec![1100]);
}

#[tokio::test]
async fn test_corrupt_image_fails_run() {
    let mut session = maker_session(MakerTab::Image);
    session
        .add_images([input("bad.png", "image/png", b"not a png".to_vec())])
        .unwrap();

    let err = session
        .create_image_pdf(&LopdfBackend::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PdfBinderError::Collaborator { .. }));
    assert_eq!(session.state(), ViewState::MakerImage);
    assert_eq!(session.images().len(), 1);
}

#[tokio::test]
async fn test_images_are_not_deduplicated() {
    let mut session = maker_session(MakerTab::Image);
    let png = png_bytes(4, 4);
    let outcome = session
        .add_images([
            input("a.png", "image/png", png.clone()),
            input("a.png", "image/png", png),
            input("notes.txt", "text/plain", b"hi".to_vec()),
        ])
        .unwrap();

    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.rejected, 1);

    let result = session
        .create_image_pdf(&LopdfBackend::default())
        .await
        .unwrap();
    assert_eq!(result.page_count(), 2);
}

#[tokio::test]
async fn test_reset_after_maker_run() {
    let mut session = maker_session(MakerTab::Image);
    session
        .add_images([input("a.png", "image/png", png_bytes(4, 4))])
        .unwrap();
    session
        .create_image_pdf(&LopdfBackend::default())
        .await
        .unwrap();

    assert_eq!(session.reset(), ViewState::Upload);
    assert_eq!(session.mode(), Mode::Merge);
    assert!(session.images().is_empty());
    assert!(session.download().is_err());

    session.switch_mode(Mode::Maker).unwrap();
    assert_eq!(session.state(), ViewState::MakerImage);
}
