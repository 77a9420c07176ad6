//! Scratch directories for tests that write rasters and tables.

/// Temporary directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("rei_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_test_dir_is_removed_on_drop() {
        let dir = temp_test_dir();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path.to_string_lossy().contains("rei_test_"));
        drop(dir);
        assert!(!path.exists());
    }
}
