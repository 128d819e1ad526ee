//! Glossary and material dictionaries behind the tooltip widgets.
//!
//! Both live at the content root as TOML arrays of tables:
//!
//! ```toml
//! # glossary.toml
//! [[term]]
//! name = "Etchant"
//! definition = "A chemical reagent that reveals microstructure by selective attack."
//!
//! # materials.toml
//! [[material]]
//! name = "Ti-6Al-4V"
//! definition = "Alpha-beta titanium alloy, the workhorse of airframe structures."
//! guide = "titanium"
//! ```
//!
//! Lookups are case-insensitive and whitespace-normalized. A missing file is
//! an empty dictionary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid dictionary {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("duplicate entry {name:?} in {path}")]
    Duplicate { name: String, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    pub name: String,
    pub definition: String,
    /// Guide slug with more detail on this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide: Option<String>,
}

/// Entries keyed by normalized name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dictionary {
    entries: BTreeMap<String, Entry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GlossaryFile {
    #[serde(default)]
    term: Vec<Entry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialsFile {
    #[serde(default)]
    material: Vec<Entry>,
}

fn normalize(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Dictionary {
    pub fn from_entries(
        entries: impl IntoIterator<Item = Entry>,
        path: &Path,
    ) -> Result<Self, DictionaryError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let key = normalize(&entry.name);
            if map.contains_key(&key) {
                return Err(DictionaryError::Duplicate {
                    name: entry.name,
                    path: path.to_path_buf(),
                });
            }
            map.insert(key, entry);
        }
        Ok(Self { entries: map })
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.entries.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, DictionaryError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load `glossary.toml` from the content root.
pub fn load_glossary(root: &Path) -> Result<Dictionary, DictionaryError> {
    let path = root.join("glossary.toml");
    let Some(content) = read_optional(&path)? else {
        return Ok(Dictionary::default());
    };
    let file: GlossaryFile = toml::from_str(&content).map_err(|source| DictionaryError::Toml {
        path: path.clone(),
        source,
    })?;
    Dictionary::from_entries(file.term, &path)
}

/// Load `materials.toml` from the content root.
pub fn load_materials(root: &Path) -> Result<Dictionary, DictionaryError> {
    let path = root.join("materials.toml");
    let Some(content) = read_optional(&path)? else {
        return Ok(Dictionary::default());
    };
    let file: MaterialsFile = toml::from_str(&content).map_err(|source| DictionaryError::Toml {
        path: path.clone(),
        source,
    })?;
    Dictionary::from_entries(file.material, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, definition: &str) -> Entry {
        Entry {
            name: name.to_string(),
            definition: definition.to_string(),
            guide: None,
        }
    }

    #[test]
    fn lookup_is_case_and_space_insensitive() {
        let dict = Dictionary::from_entries(
            [entry("Relief", "Height difference between phases.")],
            Path::new("glossary.toml"),
        )
        .unwrap();
        assert!(dict.lookup("relief").is_some());
        assert!(dict.lookup("  RELIEF ").is_some());
        assert!(dict.lookup("Edge rounding").is_none());
    }

    #[test]
    fn multi_word_keys_normalize_inner_whitespace() {
        let dict = Dictionary::from_entries(
            [entry("Edge  Retention", "Keeping edges flat.")],
            Path::new("glossary.toml"),
        )
        .unwrap();
        assert_eq!(
            dict.lookup("edge retention").unwrap().definition,
            "Keeping edges flat."
        );
    }

    #[test]
    fn duplicate_entries_rejected() {
        let result = Dictionary::from_entries(
            [entry("Nital", "a"), entry("nital", "b")],
            Path::new("glossary.toml"),
        );
        assert!(matches!(result, Err(DictionaryError::Duplicate { .. })));
    }

    #[test]
    fn missing_files_are_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(load_glossary(tmp.path()).unwrap().is_empty());
        assert!(load_materials(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn load_materials_reads_guide_links() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("materials.toml"),
            r#"
[[material]]
name = "Inconel 718"
definition = "Precipitation-hardened nickel superalloy."
guide = "superalloys"
"#,
        )
        .unwrap();
        let dict = load_materials(tmp.path()).unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(
            dict.lookup("inconel 718").unwrap().guide.as_deref(),
            Some("superalloys")
        );
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("glossary.toml"),
            "[[term]]\nname = \"Nital\"\ndefinitoin = \"typo\"\n",
        )
        .unwrap();
        assert!(matches!(
            load_glossary(tmp.path()),
            Err(DictionaryError::Toml { .. })
        ));
    }
}
