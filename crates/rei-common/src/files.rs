//! Directory scanning for input data files.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ReiError, ReiResult};

/// List files directly inside `dir` whose name ends with `extension` and
/// contains `pattern`. Results are sorted by path.
///
/// An empty `pattern` matches every file with the extension.
pub fn search_files<P: AsRef<Path>>(
    dir: P,
    extension: &str,
    pattern: &str,
) -> ReiResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ReiError::MissingDirectory(dir.display().to_string()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ReiError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(extension) && name.contains(pattern) {
            found.push(entry.into_path());
        }
    }
    found.sort();

    debug!(
        dir = %dir.display(),
        extension,
        pattern,
        count = found.len(),
        "Searched for input files"
    );
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_search_files_filters_by_extension_and_pattern() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["hsig_01.txt", "hsig_02.txt", "tp_01.txt", "hsig_03.csv"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("hsig_nested.txt")).unwrap();

        let files = search_files(dir.path(), "txt", "hsig").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["hsig_01.txt", "hsig_02.txt"]);
    }

    #[test]
    fn test_search_files_missing_directory() {
        let err = search_files("/definitely/not/here", "nc", "").unwrap_err();
        assert!(matches!(err, ReiError::MissingDirectory(_)));
    }
}
