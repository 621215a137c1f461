mod common;

use common::{Behavior, FAKE_PDF, FakeStrategy, dir_entries, pipeline_with};
use docpress::error::ConvertError;
use docpress::pipeline::ConversionRequest;
use docpress::util::sha256_hex;

fn request(filename: &str) -> ConversionRequest {
    ConversionRequest {
        filename: filename.to_string(),
        bytes: b"PK\x03\x04 docx body".to_vec(),
    }
}

#[test]
fn report_describes_the_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        dir.path(),
        vec![
            Box::new(FakeStrategy::new("office", Behavior::Fail)),
            Box::new(FakeStrategy::new("pandoc", Behavior::Succeed)),
        ],
    );

    let out = pipeline.run(request("Board Minutes.docx")).unwrap();
    assert_eq!(out.pdf, FAKE_PDF);
    assert_eq!(out.download_name, "Board_Minutes.pdf");
    assert_eq!(out.report.strategy, "pandoc");
    assert_eq!(out.report.original_filename, "Board Minutes.docx");
    assert_eq!(out.report.pdf_bytes, FAKE_PDF.len() as u64);
    assert_eq!(out.report.pdf_sha256, sha256_hex(FAKE_PDF));
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn validation_runs_before_any_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        dir.path(),
        vec![Box::new(FakeStrategy::new("office", Behavior::Succeed))],
    );

    assert!(matches!(
        pipeline.run(request("   ")),
        Err(ConvertError::EmptyFilename)
    ));
    assert!(matches!(
        pipeline.run(request("slides.pptx")),
        Err(ConvertError::UnsupportedType)
    ));
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn exhausted_chain_is_conversion_failed() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_with(
        dir.path(),
        vec![Box::new(FakeStrategy::new("office", Behavior::NoOutput))],
    );

    let err = pipeline.run(request("memo.doc")).err().unwrap();
    assert!(matches!(err, ConvertError::ConversionFailed));
    assert_eq!(err.status_code().as_u16(), 500);
    assert_eq!(err.user_message(), "Conversion failed");
    assert!(dir_entries(dir.path()).is_empty());
}

#[test]
fn pipeline_creates_its_upload_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let pipeline = pipeline_with(
        &nested,
        vec![Box::new(FakeStrategy::new("office", Behavior::Succeed))],
    );
    assert!(nested.is_dir());
    assert_eq!(pipeline.strategy_names(), vec!["office"]);
}
