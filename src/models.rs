//! Data models persisted by the crawler.
//!
//! This module defines the two record shapes written to the output folder:
//! - [`ScrapedTitleEntry`]: one line of the dedup ledger (`scraped_articles.txt`)
//! - [`ArticleRecord`]: one line of the data file (`data_train.jsonl`)
//!
//! Field names and order match the JSON Lines layout consumed by the
//! downstream classifier training scripts, hence the `texte` and `hash`
//! renames on [`ArticleRecord`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An article identity already collected by this or a previous run.
///
/// Identity is exact string equality on both fields; the same title filed
/// under two different keywords counts as two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ScrapedTitleEntry {
    /// The listing label of the article link.
    pub title: String,
    /// The keyword the article was collected under.
    pub label: String,
}

impl ScrapedTitleEntry {
    pub fn new(title: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
        }
    }
}

/// One accepted article, as written to the data file.
///
/// # Fields
///
/// * `text` - Normalized single-line article text (serialized as `texte`)
/// * `label` - The search keyword, used as the classification label
/// * `url` - The browser URL of the article page when it was read
/// * `title` - The listing label the article was reached through
/// * `content_hash` - See [`content_hash`] (serialized as `hash`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    #[serde(rename = "texte")]
    pub text: String,
    pub label: String,
    pub url: String,
    pub title: String,
    #[serde(rename = "hash")]
    pub content_hash: String,
}

impl ArticleRecord {
    /// Build a record, computing its content hash.
    pub fn new(title: String, text: String, label: String, url: String) -> Self {
        let content_hash = content_hash(&title, &text, &label);
        Self {
            text,
            label,
            url,
            title,
            content_hash,
        }
    }

    /// The ledger entry that marks this article as collected.
    pub fn ledger_entry(&self) -> ScrapedTitleEntry {
        ScrapedTitleEntry::new(self.title.clone(), self.label.clone())
    }
}

/// Hex-encoded SHA-256 of `title ++ text ++ label`.
///
/// Used only to suppress duplicates inside a single run; cross-run dedup
/// goes through the ledger's `(title, label)` pairs.
pub fn content_hash(title: &str, text: &str, label: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(text.as_bytes());
    hasher.update(label.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_record_serialization_layout() {
        let record = ArticleRecord::new(
            "Titre".to_string(),
            "Du texte".to_string(),
            "Sports".to_string(),
            "https://example.com/doc/1".to_string(),
        );

        let json = serde_json::to_string(&record).unwrap();
        let expected = format!(
            r#"{{"texte":"Du texte","label":"Sports","url":"https://example.com/doc/1","title":"Titre","hash":"{}"}}"#,
            record.content_hash
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn test_ledger_entry_deserialization() {
        let entry: ScrapedTitleEntry =
            serde_json::from_str(r#"{"title": "A", "label": "Sports"}"#).unwrap();
        assert_eq!(entry, ScrapedTitleEntry::new("A", "Sports"));
    }

    #[test]
    fn test_non_ascii_kept_verbatim() {
        let entry = ScrapedTitleEntry::new("Été", "Économie");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"title":"Été","label":"Économie"}"#);
    }

    #[test]
    fn test_content_hash_is_sha256_of_concatenation() {
        // sha256("abc")
        assert_eq!(
            content_hash("a", "b", "c"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_hash_depends_on_label() {
        assert_ne!(
            content_hash("Title", "same text", "Sports"),
            content_hash("Title", "same text", "Santé")
        );
    }

    #[test]
    fn test_ledger_entry_from_record() {
        let record = ArticleRecord::new(
            "B".to_string(),
            "text".to_string(),
            "Sports".to_string(),
            "https://example.com".to_string(),
        );
        assert_eq!(record.ledger_entry(), ScrapedTitleEntry::new("B", "Sports"));
    }
}
