use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;
use tracing::warn;

use crate::error::{Result, TasbeehError};

static DHIKR_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/dhikr");

/// Id selected when nothing has been persisted yet
pub const DEFAULT_DHIKR_ID: &str = "subhanallah";

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Dhikr {
    pub id: String,
    pub arabic: String,
    pub transliteration: String,
    pub translation: String,
    pub suggested_target: u32,
}

#[allow(dead_code)]
#[derive(Deserialize, Clone, Debug)]
struct DhikrCollection {
    name: String,
    phrases: Vec<Dhikr>,
}

/// Remembrance phrases bundled into the binary
#[derive(Clone, Debug, Default)]
pub struct DhikrCatalog {
    phrases: Vec<Dhikr>,
}

impl DhikrCatalog {
    /// Catalogue compiled in from `src/dhikr/*.json`. A malformed bundle logs
    /// and yields an empty catalogue; counting still works with raw ids.
    pub fn embedded() -> Self {
        Self::from_dir(&DHIKR_DIR).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read embedded dhikr catalogue");
            Self::default()
        })
    }

    fn from_dir(dir: &Dir) -> Result<Self> {
        let mut files: Vec<_> = dir
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));

        let mut phrases = Vec::new();
        for file in files {
            let text = file.contents_utf8().ok_or_else(|| {
                TasbeehError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("{} is not UTF-8", file.path().display()),
                ))
            })?;
            let collection: DhikrCollection = from_str(text)?;
            phrases.extend(collection.phrases);
        }

        Ok(Self { phrases })
    }

    pub fn from_phrases(phrases: Vec<Dhikr>) -> Self {
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dhikr> {
        self.phrases.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Dhikr> {
        self.phrases.iter().find(|d| d.id == id)
    }

    /// The phrase after `id`, wrapping around. Unknown ids start from the top.
    pub fn next_after(&self, id: &str) -> Option<&Dhikr> {
        match self.phrases.iter().position(|d| d.id == id) {
            Some(i) => self.phrases.get((i + 1) % self.phrases.len()),
            None => self.phrases.first(),
        }
    }

    /// Display label for an id, falling back to the raw id
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |d| d.transliteration.as_str())
    }
}
