//! Model discovery under the languages directory.
//!
//! Models live one subdirectory per language: `<languages_dir>/en/` holds
//! the English model files.  Lookup tries the exact language tag first
//! (`de_DE`), then any directory sharing its primary tag (`de`, `de_AT`),
//! so a region-specific `$LANG` still finds a plain-language model.
//! Everything here is pure path enumeration; no global state.

use std::path::{Path, PathBuf};

/// File extension a model file must carry.
pub const MODEL_EXTENSION: &str = "bin";

/// Primary tag of a language code: `"de_DE"` → `"de"`.
pub fn primary_tag(language: &str) -> &str {
    language
        .split(['_', '-'])
        .next()
        .unwrap_or(language)
}

/// Directories to search for `language`'s model, most specific first.
pub fn candidate_dirs(languages_dir: &Path, language: &str) -> Vec<PathBuf> {
    let exact = languages_dir.join(language);
    let mut dirs = vec![exact.clone()];

    let prefix = primary_tag(language);
    let Ok(entries) = std::fs::read_dir(languages_dir) else {
        return dirs;
    };
    let mut fallbacks: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|name| primary_tag(name) == prefix)
        })
        .map(|e| e.path())
        .filter(|p| *p != exact)
        .collect();
    fallbacks.sort();
    dirs.extend(fallbacks);
    dirs
}

/// First model file for `language`, searching [`candidate_dirs`] in order
/// (files within a directory in name order, for determinism).
pub fn find_model(languages_dir: &Path, language: &str) -> Option<PathBuf> {
    for dir in candidate_dirs(languages_dir, language) {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut models: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext == MODEL_EXTENSION)
            })
            .collect();
        models.sort();
        if let Some(model) = models.into_iter().next() {
            return Some(model);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn primary_tag_strips_region() {
        assert_eq!(primary_tag("de_DE"), "de");
        assert_eq!(primary_tag("pt-BR"), "pt");
        assert_eq!(primary_tag("en"), "en");
    }

    #[test]
    fn exact_language_dir_wins() {
        let root = tempdir().unwrap();
        touch(&root.path().join("en/model.bin"));
        touch(&root.path().join("en_US/other.bin"));

        let found = find_model(root.path(), "en").unwrap();
        assert!(found.ends_with("en/model.bin"));
    }

    #[test]
    fn falls_back_to_same_primary_tag() {
        let root = tempdir().unwrap();
        touch(&root.path().join("de/model.bin"));

        let found = find_model(root.path(), "de_DE").unwrap();
        assert!(found.ends_with("de/model.bin"));
    }

    #[test]
    fn ignores_files_with_other_extensions() {
        let root = tempdir().unwrap();
        touch(&root.path().join("en/readme.txt"));
        touch(&root.path().join("en/model.scorer"));

        assert!(find_model(root.path(), "en").is_none());
    }

    #[test]
    fn missing_languages_dir_finds_nothing() {
        let root = tempdir().unwrap();
        assert!(find_model(&root.path().join("absent"), "en").is_none());
    }

    #[test]
    fn unrelated_languages_are_not_candidates() {
        let root = tempdir().unwrap();
        touch(&root.path().join("fr/model.bin"));

        assert!(find_model(root.path(), "de").is_none());
    }
}
