use std::fs;

use hirex_core::CachedState;
use hirex_engine::{BlobRegistry, ExportError, Exporter, PdfVariant};
use tempfile::TempDir;

fn cached() -> CachedState {
    CachedState {
        document_text: "\\documentclass{article}".to_string(),
        primary_pdf_base64: Some("JVBERi0xLjQ=".to_string()),
        company_name: "Acme Corp".to_string(),
        role_name: "ML/Data Engineer".to_string(),
        ..CachedState::default()
    }
}

#[test]
fn text_export_uses_generated_name() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path());

    let path = exporter.export_text(&cached(), None).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("Acme_Corp_ML_Data_Engineer_resume_"), "{name}");
    assert!(name.ends_with(".tex"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "\\documentclass{article}");
}

#[test]
fn explicit_filename_is_used_verbatim() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path());

    let path = exporter.export_text(&cached(), Some("mine.tex")).unwrap();

    assert_eq!(path, temp.path().join("mine.tex"));
}

#[test]
fn pdf_export_decodes_and_registers_a_blob() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path().join("out"));
    let mut blobs = BlobRegistry::new();

    let exported = exporter
        .export_pdf(&cached(), PdfVariant::Primary, None, &mut blobs)
        .unwrap();

    assert_eq!(fs::read(&exported.path).unwrap(), b"%PDF-1.4");
    assert_eq!(fs::read(&exported.handle.path).unwrap(), b"%PDF-1.4");
    assert_eq!(blobs.len(), 1);

    let blob_path = exported.handle.path.clone();
    blobs.release_all();
    assert!(blobs.is_empty());
    assert!(!blob_path.exists());
    assert!(exported.path.exists());
}

#[test]
fn missing_variant_is_nothing_cached() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path());
    let mut blobs = BlobRegistry::new();

    let err = exporter
        .export_pdf(&cached(), PdfVariant::Humanized, None, &mut blobs)
        .unwrap_err();
    assert!(matches!(err, ExportError::NothingCached));

    let err = exporter
        .export_text(&CachedState::default(), None)
        .unwrap_err();
    assert!(matches!(err, ExportError::NothingCached));
}

#[test]
fn invalid_base64_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let exporter = Exporter::new(temp.path());
    let mut blobs = BlobRegistry::new();
    let mut state = cached();
    state.primary_pdf_base64 = Some("%%% not base64".to_string());

    let err = exporter
        .export_pdf(&state, PdfVariant::Primary, None, &mut blobs)
        .unwrap_err();

    assert!(matches!(err, ExportError::InvalidBase64(_)));
    assert!(blobs.is_empty());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn dropping_the_registry_releases_blobs() {
    let mut blobs = BlobRegistry::new();
    let first = blobs.create("a", b"one").unwrap();
    let second = blobs.create("b", b"two").unwrap();
    assert_ne!(first.id, second.id);

    assert!(blobs.release(&first));
    assert!(!blobs.release(&first));
    assert!(!first.path.exists());
    assert!(second.path.exists());

    drop(blobs);
    assert!(!second.path.exists());
}
