use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// One localized string. Only the key and the English text are touched;
/// every other language field is carried through unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StringEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "enUS", default)]
    pub en_us: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl StringEntry {
    pub fn new(id: Option<i64>, key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
            en_us: text.into(),
            other: Map::new(),
        }
    }
}

/// A string table as shipped in `strings/*.json`: a JSON array of entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringTable {
    pub entries: Vec<StringEntry>,
}

impl StringTable {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let entries: Vec<StringEntry> = serde_json::from_str(text)?;
        Ok(Self { entries })
    }

    /// Pretty JSON with a BOM and CRLF line endings, the way the game ships it.
    pub fn to_json(&self) -> Result<String> {
        let body = serde_json::to_string_pretty(&self.entries)?;
        Ok(format!("\u{feff}{}\r\n", body.replace('\n', "\r\n")))
    }

    pub fn get(&self, key: &str) -> Option<&StringEntry> {
        self.entries.iter().find(|e| e.key.eq_ignore_ascii_case(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut StringEntry> {
        self.entries.iter_mut().find(|e| e.key.eq_ignore_ascii_case(key))
    }

    /// Set the English text of `key`, appending a new entry when absent.
    pub fn set(&mut self, key: &str, text: &str) {
        match self.entries.iter_mut().find(|e| e.key.eq_ignore_ascii_case(key)) {
            Some(entry) => entry.en_us = text.to_string(),
            None => {
                let id = self.next_id();
                self.entries.push(StringEntry::new(id, key, text));
            }
        }
    }

    fn next_id(&self) -> Option<i64> {
        self.entries.iter().filter_map(|e| e.id).max().map(|m| m + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
