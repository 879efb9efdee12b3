use super::*;
use tempfile::TempDir;

#[test]
fn absent_directory_is_not_present() {
    let temp_dir = TempDir::new().expect("create temp dir");
    assert!(!index_is_present(&temp_dir.path().join("missing")));
}

#[test]
fn empty_directory_is_not_present() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let index_dir = temp_dir.path().join("index");
    fs::create_dir_all(&index_dir).expect("create index dir");

    assert!(!index_is_present(&index_dir));
}

#[test]
fn populated_directory_is_present() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let index_dir = temp_dir.path().join("index");
    fs::create_dir_all(&index_dir).expect("create index dir");
    fs::write(index_dir.join("data.lance"), b"stub").expect("write marker");

    assert!(index_is_present(&index_dir));
}

#[test]
fn present_index_short_circuits_without_a_url() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let index_dir = temp_dir.path().join("index");
    fs::create_dir_all(&index_dir).expect("create index dir");
    fs::write(index_dir.join("data.lance"), b"stub").expect("write marker");

    // No archive URL configured: only the local-presence path can succeed.
    ensure_index_available(&index_dir, None).expect("present index should short-circuit");
}

#[test]
fn missing_index_without_a_url_is_fatal() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let index_dir = temp_dir.path().join("index");

    let result = ensure_index_available(&index_dir, None);
    assert!(matches!(result, Err(crate::AskError::Fetch(_))));
}

#[test]
fn layout_with_contents_at_root_is_root() {
    let temp_dir = TempDir::new().expect("create temp dir");
    fs::write(temp_dir.path().join("data.lance"), b"stub").expect("write entry");
    fs::write(temp_dir.path().join("manifest"), b"stub").expect("write entry");

    let layout =
        detect_layout(temp_dir.path(), OsStr::new("index")).expect("detection should succeed");
    assert_eq!(layout, ArchiveLayout::Root);
}

#[test]
fn layout_with_a_single_matching_directory_is_nested() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let nested = temp_dir.path().join("index");
    fs::create_dir_all(&nested).expect("create nested dir");
    fs::write(nested.join("data.lance"), b"stub").expect("write entry");

    let layout =
        detect_layout(temp_dir.path(), OsStr::new("index")).expect("detection should succeed");
    assert_eq!(layout, ArchiveLayout::Nested);
}

#[test]
fn single_directory_with_another_name_is_root() {
    let temp_dir = TempDir::new().expect("create temp dir");
    fs::create_dir_all(temp_dir.path().join("something-else")).expect("create dir");

    let layout =
        detect_layout(temp_dir.path(), OsStr::new("index")).expect("detection should succeed");
    assert_eq!(layout, ArchiveLayout::Root);
}

#[test]
fn empty_archive_is_an_error() {
    let temp_dir = TempDir::new().expect("create temp dir");

    let result = detect_layout(temp_dir.path(), OsStr::new("index"));
    assert!(matches!(result, Err(crate::AskError::Fetch(_))));
}
