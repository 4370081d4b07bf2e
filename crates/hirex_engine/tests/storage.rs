use std::fs;
use std::sync::Arc;

use hirex_engine::{
    ensure_output_dir, AtomicFileWriter, ChangeBus, FileBackend, MemoryBackend, StorageAdapter,
    StorageBackend, StorageError,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    rounds: Vec<u32>,
}

#[test]
fn file_backend_round_trip_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("storage.ron");

    let storage = StorageAdapter::open_file(&path, 1024 * 1024);
    assert!(storage.set("hirex_company", "Acme"));
    assert!(storage.set("hirex_role", "Engineer"));
    storage.remove("hirex_role");

    let reopened = StorageAdapter::open_file(&path, 1024 * 1024);
    assert_eq!(reopened.get("hirex_company").as_deref(), Some("Acme"));
    assert_eq!(reopened.get("hirex_role"), None);
    assert_eq!(reopened.get("never_written"), None);
}

#[test]
fn malformed_json_reads_as_absent() {
    let storage = StorageAdapter::in_memory();
    assert!(storage.set("hirex_saved_paths", "[not json"));

    assert_eq!(storage.get_json::<Vec<String>>("hirex_saved_paths"), None);
    assert_eq!(
        storage.get_json_or_default::<Sample>("hirex_saved_paths"),
        Sample::default()
    );

    let sample = Sample {
        name: "a".into(),
        rounds: vec![1, 2],
    };
    assert!(storage.set_json("sample", &sample));
    assert_eq!(storage.get_json::<Sample>("sample"), Some(sample));
}

#[test]
fn quota_exceeded_is_reported_as_false() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::with_quota(temp.path().join("storage.ron"), 64);

    let err = backend.write("big", &"x".repeat(200)).unwrap_err();
    assert!(matches!(err, StorageError::QuotaExceeded { limit: 64, .. }));

    let storage = StorageAdapter::new(Arc::new(backend), Arc::new(ChangeBus::new()));
    assert!(storage.set("small", "ok"));
    assert!(!storage.set("big", &"x".repeat(200)));
    assert_eq!(storage.get("small").as_deref(), Some("ok"));
    assert_eq!(storage.get("big"), None);
}

#[test]
fn corrupt_file_reads_empty_and_is_replaced_on_write() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("storage.ron");
    fs::write(&path, "{ this is not ron").unwrap();

    let storage = StorageAdapter::open_file(&path, 1024 * 1024);
    assert_eq!(storage.get("anything"), None);

    assert!(storage.set("hirex_tex", "\\begin{document}"));
    assert_eq!(storage.get("hirex_tex").as_deref(), Some("\\begin{document}"));
}

#[test]
fn failing_backend_never_panics() {
    let backend = Arc::new(MemoryBackend::new());
    let storage = StorageAdapter::new(backend.clone(), Arc::new(ChangeBus::new()));

    backend.set_fail_writes(true);
    assert!(!storage.set("k", "v"));
    assert!(!storage.set_json("k", &vec![1, 2, 3]));
    assert!(backend.keys().is_empty());

    backend.set_fail_writes(false);
    assert!(storage.set("k", "v"));
    assert_eq!(backend.keys(), vec!["k".to_string()]);
}

#[test]
fn writes_are_visible_to_other_tabs_only() {
    let tab_a = StorageAdapter::in_memory();
    let tab_b = tab_a.new_tab();
    assert_ne!(tab_a.origin(), tab_b.origin());

    let seen_by_a = tab_a.subscribe();
    let seen_by_b = tab_b.subscribe();

    tab_a.set("hirex-theme", "dark");

    assert!(seen_by_a.drain().is_empty());
    let changes = seen_by_b.drain();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, "hirex-theme");
    assert_eq!(changes[0].new_value.as_deref(), Some("dark"));
    assert_eq!(tab_b.get("hirex-theme").as_deref(), Some("dark"));
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("exports");
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_writer_refuses_a_file_as_directory() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("resume.tex", "data").is_err());
    assert!(!file_path.with_file_name("resume.tex").exists());
}
