//! Small file-location helpers for history exports.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Lower-case file extension, if any.
pub fn fileext_to_lcstring(path: &Path) -> Option<String> {
    path.extension()?.to_str().map(|ext| ext.to_lowercase())
}

/// Returns the matched extension if `path` carries one of `extensions`
/// (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> Option<String> {
    let ext = fileext_to_lcstring(path)?;
    extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
        .then_some(ext)
}

/// Recursively locate location-history JSON files under `dir`.
/// Unreadable entries are skipped, typically due to permissions.
pub fn locate_history_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for result in WalkDir::new(dir) {
        let entry = match result {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, &["json"]).is_some() {
            files.push(path.to_owned());
        }
    }
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert_eq!(
            has_extension(Path::new("Takeout/History.JSON"), &["json"]),
            Some("json".to_string())
        );
        assert_eq!(has_extension(Path::new("history.jsonl"), &["json"]), None);
        assert_eq!(has_extension(Path::new("no_extension"), &["json"]), None);
    }
}
