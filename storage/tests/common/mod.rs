use tempfile::TempDir;

/// Creates a temp directory and returns it together with a database path
/// inside it. The directory must outlive the pool.
pub fn temp_db() -> (TempDir, String) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}
