//! End-to-end tests against a real LibreOffice and libpdfium.
//!
//! Documents are generated on the fly as minimal `.docx` packages, so no
//! fixtures are needed. The tests are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use doc2pdf_gate::{
    BatchPipeline, FormatConverter, InputDescriptor, PageCounter, PdfiumPageCounter,
    PipelineConfig, PipelineOutcome, SofficeConverter,
};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

fn soffice() -> SofficeConverter {
    SofficeConverter::new(std::env::var("SOFFICE_PATH").unwrap_or_else(|_| "soffice".into()))
}

fn page_counter() -> PdfiumPageCounter {
    PdfiumPageCounter::new(std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from))
}

/// A minimal WordprocessingML package with one paragraph per entry and a
/// page break between entries.
fn docx(pages: &[&str]) -> Vec<u8> {
    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;
    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

    let paragraphs: Vec<String> = pages
        .iter()
        .map(|text| format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"))
        .collect();
    let body = paragraphs.join(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn pipeline(config: PipelineConfig) -> BatchPipeline {
    BatchPipeline::new(config, Arc::new(soffice()), Arc::new(page_counter()))
}

// ── Stage tests ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pdfium_probe() {
    e2e_skip_unless_ready!();
    page_counter().probe().await.expect("libpdfium must be loadable");
}

#[tokio::test]
async fn test_soffice_converts_docx() {
    e2e_skip_unless_ready!();
    let scratch = tempfile::tempdir().unwrap();
    let source = InputDescriptor::new(Some("hello.docx"), docx(&["Hello, world"]));

    let pdf = soffice().convert(&source, scratch.path()).await.unwrap();
    assert!(pdf.starts_with(b"%PDF"), "not a PDF");

    let pages = page_counter().count_pages(&pdf).await.unwrap();
    assert_eq!(pages, 1);
}

#[tokio::test]
async fn test_page_breaks_are_counted() {
    e2e_skip_unless_ready!();
    let scratch = tempfile::tempdir().unwrap();
    let source = InputDescriptor::new(Some("three.docx"), docx(&["one", "two", "three"]));

    let pdf = soffice().convert(&source, scratch.path()).await.unwrap();
    assert_eq!(page_counter().count_pages(&pdf).await.unwrap(), 3);
}

#[tokio::test]
async fn test_garbage_input_is_a_converter_failure() {
    e2e_skip_unless_ready!();
    let scratch = tempfile::tempdir().unwrap();
    let source = InputDescriptor::new(Some("junk.docx"), b"PK\x03\x04 definitely not a document".to_vec());
    // LibreOffice either refuses or emits something; both must be reported,
    // never panic.
    match soffice().convert(&source, scratch.path()).await {
        Ok(bytes) => println!("soffice produced {} bytes for junk input", bytes.len()),
        Err(e) => println!("soffice rejected junk input: {e}"),
    }
}

#[tokio::test]
async fn test_page_counter_rejects_non_pdf() {
    e2e_skip_unless_ready!();
    assert!(page_counter().count_pages(b"%PDF-1.7 truncated").await.is_err());
}

// ── Whole pipeline ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_to_zip() {
    e2e_skip_unless_ready!();
    let outcome = pipeline(PipelineConfig::default())
        .run(
            vec![
                InputDescriptor::new(Some("first.docx"), docx(&["first"])),
                InputDescriptor::new(Some("second.docx"), docx(&["a", "b"])),
            ],
            None,
        )
        .await
        .unwrap();

    let PipelineOutcome::Ready(bundle) = outcome else {
        panic!("expected a bundle, got {outcome:?}");
    };
    let names: Vec<_> = bundle.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["first.pdf", "second.pdf"]);
    assert_eq!(bundle.total_pages(), 3);

    let out = std::env::temp_dir().join("doc2pdf_e2e_converted_pdfs.zip");
    std::fs::write(&out, &bundle.archive).unwrap();
    println!("archive written to {}", out.display());
}

#[tokio::test]
async fn test_page_gate_with_real_counts() {
    e2e_skip_unless_ready!();
    let config = PipelineConfig::builder().max_free_pages(1).build().unwrap();
    // No order service: a closed gate is reported as unavailable.
    let err = pipeline(config)
        .run(
            vec![InputDescriptor::new(Some("two.docx"), docx(&["a", "b"]))],
            None,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("two.docx has 2 pages"), "got: {err}");
}
