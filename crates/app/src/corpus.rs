//! Loads item sets from a directory of JSON files.
//!
//! Layout: `<root>/<level>/<set name>.json`, each file a JSON array of records.

use std::path::Path;

use anyhow::{Context, Result};
use quiz_core::model::{Item, ItemId, ItemSet};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Question Text")]
    prompt: String,
    #[serde(rename = "Option 1", default)]
    reading: String,
    #[serde(rename = "Answer explanation", default)]
    meaning: String,
}

/// All sets found under a corpus root, sorted by level then name.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    sets: Vec<ItemSet>,
}

impl Corpus {
    /// Read every `*.json` file one directory level below `root`.
    ///
    /// Files with no usable records are skipped.
    ///
    /// # Errors
    ///
    /// Fails if a directory cannot be listed or a file is not valid JSON.
    pub fn load_dir(root: &Path) -> Result<Self> {
        let mut levels: Vec<_> = std::fs::read_dir(root)
            .with_context(|| format!("failed to read corpus dir {}", root.display()))?
            .collect::<Result<_, _>>()?;
        levels.sort_by_key(std::fs::DirEntry::file_name);

        let mut sets = Vec::new();
        for level_entry in levels {
            if !level_entry.file_type()?.is_dir() {
                continue;
            }
            let level = level_entry.file_name().to_string_lossy().into_owned();

            let mut files: Vec<_> = std::fs::read_dir(level_entry.path())?
                .collect::<Result<_, _>>()?;
            files.sort_by_key(std::fs::DirEntry::file_name);

            for file in files {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(set) = load_set_file(&level, &path)? {
                    sets.push(set);
                }
            }
        }

        debug!(sets = sets.len(), root = %root.display(), "loaded corpus");
        Ok(Self { sets })
    }

    #[must_use]
    pub fn sets(&self) -> &[ItemSet] {
        &self.sets
    }

    /// Look a set up by its identity (`<level>_<name>`).
    #[must_use]
    pub fn find(&self, identity: &str) -> Option<&ItemSet> {
        self.sets.iter().find(|s| s.identity().as_str() == identity)
    }
}

/// Parse one set file. Returns `None` when no record yields an item.
///
/// Item ids are derived from level, set name, position, and prompt, so the
/// same file always produces the same ids.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_set_file(level: &str, path: &Path) -> Result<Option<ItemSet>> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("no file name in {}", path.display()))?;

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<RawRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid corpus file {}", path.display()))?;

    let mut items = Vec::with_capacity(records.len());
    for (position, record) in records.into_iter().enumerate() {
        let id = ItemId::derived(&format!("{level}/{name}/{position}/{}", record.prompt));
        match Item::new(id, record.prompt, record.reading, record.meaning) {
            Ok(item) => items.push(item),
            Err(e) => warn!(file = %path.display(), position, error = %e, "skipping record"),
        }
    }

    if items.is_empty() {
        warn!(file = %path.display(), "no usable records; skipping set");
        return Ok(None);
    }

    let set = ItemSet::new(level, name, items)
        .with_context(|| format!("invalid set in {}", path.display()))?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VERBS: &str = r#"[
        {"Question Text": "食べる", "Option 1": "たべる", "Answer explanation": "makan"},
        {"Question Text": "飲む", "Option 1": "のむ", "Answer explanation": "minum"},
        {"Question Text": "  ", "Option 1": "x", "Answer explanation": "y"},
        {"Question Text": "見る"}
    ]"#;

    fn write_corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("N5")).unwrap();
        fs::create_dir_all(dir.path().join("N4")).unwrap();
        fs::write(dir.path().join("N5/kata_kerja_n5.json"), VERBS).unwrap();
        fs::write(dir.path().join("N5/empty.json"), "[]").unwrap();
        fs::write(dir.path().join("N5/notes.txt"), "ignored").unwrap();
        fs::write(
            dir.path().join("N4/kata_benda_n4.json"),
            r#"[{"Question Text": "山", "Option 1": "やま", "Answer explanation": "gunung"}]"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn loads_sets_sorted_and_skips_unusable() {
        let dir = write_corpus();
        let corpus = Corpus::load_dir(dir.path()).unwrap();

        let ids: Vec<String> = corpus
            .sets()
            .iter()
            .map(|s| s.identity().as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["N4_kata_benda_n4", "N5_kata_kerja_n5"]);

        let verbs = corpus.find("N5_kata_kerja_n5").unwrap();
        assert_eq!(verbs.len(), 3);
        let last = &verbs.items()[2];
        assert_eq!(last.prompt(), "見る");
        assert!(!last.has_reading());
        assert!(!last.has_meaning());
    }

    #[test]
    fn item_ids_are_stable_across_loads() {
        let dir = write_corpus();
        let first = Corpus::load_dir(dir.path()).unwrap();
        let second = Corpus::load_dir(dir.path()).unwrap();
        assert_eq!(first.sets(), second.sets());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("N3")).unwrap();
        fs::write(dir.path().join("N3/broken.json"), "{not json").unwrap();
        let err = Corpus::load_dir(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid corpus file"));
    }
}
