//! Integration tests for the merge lane.

use pdfbinder::backend::PdfBackend;
use pdfbinder::{
    LopdfBackend, PdfBinderError, RawInput, Session, SortKey, ViewState,
};
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{input, page_count, page_widths, pdf_input, pdf_with_page_widths, write_fixture};

#[tokio::test]
async fn test_merge_keeps_store_order() {
    let mut session = Session::default();
    session
        .add_files([pdf_input("a.pdf", &[101, 102]), pdf_input("b.pdf", &[201])])
        .unwrap();

    let result = session.merge(&LopdfBackend::default()).await.unwrap();

    assert_eq!(result.page_count(), 3);
    assert_eq!(page_widths(result.bytes()), vec![101, 102, 201]);
    assert_eq!(session.state(), ViewState::Ready);
    assert_eq!(session.download().unwrap().filename(), "merged.pdf");
}

#[tokio::test]
async fn test_merge_after_reorder() {
    let mut session = Session::default();
    session
        .add_files([
            pdf_input("a.pdf", &[101]),
            pdf_input("b.pdf", &[201, 202]),
            pdf_input("c.pdf", &[301]),
        ])
        .unwrap();
    session.move_file(2, 0).unwrap();

    let result = session.merge(&LopdfBackend::default()).await.unwrap();
    assert_eq!(page_widths(result.bytes()), vec![301, 101, 201, 202]);
}

#[rstest]
#[case(SortKey::NameAsc, vec![101, 201, 301])]
#[case(SortKey::NameDesc, vec![301, 201, 101])]
#[tokio::test]
async fn test_merge_after_sort(#[case] key: SortKey, #[case] expected: Vec<i64>) {
    let mut session = Session::default();
    session
        .add_files([
            pdf_input("beta.pdf", &[201]),
            pdf_input("Gamma.pdf", &[301]),
            pdf_input("alpha.pdf", &[101]),
        ])
        .unwrap();
    session.sort_files(key).unwrap();

    let result = session.merge(&LopdfBackend::default()).await.unwrap();
    assert_eq!(page_widths(result.bytes()), expected);
}

#[tokio::test]
async fn test_merge_files_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_fixture(temp_dir.path(), "a.pdf", &pdf_with_page_widths(&[100]));
    let b = write_fixture(temp_dir.path(), "b.pdf", &pdf_with_page_widths(&[200, 300]));

    let mut session = Session::default();
    session
        .add_files([
            RawInput::from_path(&a).await.unwrap(),
            RawInput::from_path(&b).await.unwrap(),
        ])
        .unwrap();

    let result = session.merge(&LopdfBackend::default()).await.unwrap();
    assert_eq!(page_count(result.bytes()), 3);
}

#[tokio::test]
async fn test_corrupt_input_aborts_merge() {
    let mut session = Session::default();
    session
        .add_files([
            pdf_input("good.pdf", &[100]),
            input("broken.pdf", "application/pdf", b"%PDF-1.7 garbage".to_vec()),
        ])
        .unwrap();

    let err = session.merge(&LopdfBackend::default()).await.unwrap_err();

    assert!(matches!(err, PdfBinderError::Parse { ref name, .. } if name == "broken.pdf"));
    assert_eq!(session.state(), ViewState::Reviewing);
    assert!(session.result().is_none());
    assert!(!session.is_busy());
    assert_eq!(session.files().len(), 2);
}

#[tokio::test]
async fn test_deleted_file_aborts_merge() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_fixture(temp_dir.path(), "a.pdf", &pdf_with_page_widths(&[100]));
    let b = write_fixture(temp_dir.path(), "b.pdf", &pdf_with_page_widths(&[200]));

    let mut session = Session::default();
    session
        .add_files([
            RawInput::from_path(&a).await.unwrap(),
            RawInput::from_path(&b).await.unwrap(),
        ])
        .unwrap();
    std::fs::remove_file(&b).unwrap();

    let err = session.merge(&LopdfBackend::default()).await.unwrap_err();
    assert!(matches!(err, PdfBinderError::InputRead { .. }));
    assert_eq!(session.state(), ViewState::Reviewing);
}

#[tokio::test]
async fn test_single_file_merge_rejected() {
    let mut session = Session::default();
    session.add_files([pdf_input("only.pdf", &[100])]).unwrap();

    let err = session.merge(&LopdfBackend::default()).await.unwrap_err();

    assert!(matches!(
        err,
        PdfBinderError::NotEnoughInputs {
            required: 2,
            actual: 1
        }
    ));
    assert_eq!(session.state(), ViewState::Reviewing);
}

#[tokio::test]
async fn test_duplicates_are_dropped_across_adds() {
    let mut session = Session::default();
    session.add_files([pdf_input("a.pdf", &[100])]).unwrap();
    let outcome = session.add_files([pdf_input("a.pdf", &[100])]).unwrap();

    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(session.files().names(), vec!["a.pdf"]);
}

#[tokio::test]
async fn test_run_discarded_by_reset() {
    let backend = LopdfBackend::default();
    let mut session = Session::default();
    session
        .add_files([pdf_input("a.pdf", &[100]), pdf_input("b.pdf", &[200])])
        .unwrap();

    let job = session.begin_merge().unwrap();
    let ticket = job.ticket();
    assert!(matches!(
        session.remove_file(0),
        Err(PdfBinderError::Busy)
    ));

    session.reset();
    let outcome = job.run(&backend).await;
    assert!(outcome.is_ok());

    assert!(!session.complete(ticket, outcome).unwrap());
    assert_eq!(session.state(), ViewState::Upload);
    assert!(session.result().is_none());
    assert!(session.files().is_empty());
}

#[tokio::test]
async fn test_merge_output_reloads_with_backend() {
    let backend = LopdfBackend::default();
    let mut session = Session::default();
    session
        .add_files([pdf_input("a.pdf", &[100, 110]), pdf_input("b.pdf", &[200])])
        .unwrap();
    let result = session.merge(&backend).await.unwrap();

    let doc = backend.load_document("merged.pdf", result.bytes()).unwrap();
    assert_eq!(backend.page_count(&doc), 3);
}
