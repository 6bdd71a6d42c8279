//! Append-only record store inside the output folder.
//!
//! Two JSON Lines files are kept side by side:
//!
//! ```text
//! output_folder/
//! ├── scraped_articles.txt   # ledger: {"title", "label"} per line
//! └── data_train.jsonl       # data: {"texte", "label", "url", "title", "hash"} per line
//! ```
//!
//! Neither file is ever truncated or rewritten. Both appends happen once,
//! after every keyword has been processed, so an aborted run leaves both
//! files exactly as they were when it started.

use crate::config::LedgerPolicy;
use crate::error::{CrawlError, Result};
use crate::models::{ArticleRecord, ScrapedTitleEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

pub const LEDGER_FILE: &str = "scraped_articles.txt";
pub const DATA_FILE: &str = "data_train.jsonl";

#[derive(Debug, Clone)]
pub struct RecordStore {
    folder: PathBuf,
}

impl RecordStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.folder.join(LEDGER_FILE)
    }

    pub fn data_path(&self) -> PathBuf {
        self.folder.join(DATA_FILE)
    }

    /// Load every ledger entry, in file order.
    ///
    /// Creates an empty ledger file if none exists. Blank lines are ignored;
    /// malformed lines are handled according to `policy`.
    ///
    /// # Errors
    ///
    /// I/O errors, and [`CrawlError::CorruptLedgerEntry`] for the first
    /// malformed line under [`LedgerPolicy::Abort`].
    #[instrument(level = "info", skip(self), fields(path = %self.ledger_path().display()))]
    pub async fn load_ledger(&self, policy: LedgerPolicy) -> Result<Vec<ScrapedTitleEntry>> {
        let path = self.ledger_path();
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No ledger found; creating an empty one");
                fs::write(&path, b"").await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScrapedTitleEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(source) => match policy {
                    LedgerPolicy::Abort => {
                        return Err(CrawlError::CorruptLedgerEntry {
                            line: idx + 1,
                            source,
                        });
                    }
                    LedgerPolicy::Skip => {
                        warn!(line = idx + 1, error = %source, "Skipping malformed ledger line");
                        skipped += 1;
                    }
                },
            }
        }

        info!(count = entries.len(), skipped, "Loaded previously scraped titles");
        Ok(entries)
    }

    /// Append one line per record to the data file, creating it if absent.
    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    pub async fn append_articles(&self, records: &[ArticleRecord]) -> Result<()> {
        append_lines(&self.data_path(), records).await?;
        info!(path = %self.data_path().display(), "Appended article records");
        Ok(())
    }

    /// Append one line per entry to the ledger, creating it if absent.
    #[instrument(level = "info", skip_all, fields(count = entries.len()))]
    pub async fn append_ledger_entries(&self, entries: &[ScrapedTitleEntry]) -> Result<()> {
        append_lines(&self.ledger_path(), entries).await?;
        info!(path = %self.ledger_path().display(), "Appended ledger entries");
        Ok(())
    }
}

/// Serialize everything up front so a serialization failure writes nothing.
async fn append_lines<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut buf = String::new();
    for item in items {
        buf.push_str(&serde_json::to_string(item)?);
        buf.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(title: &str, label: &str) -> ArticleRecord {
        ArticleRecord::new(
            title.to_string(),
            format!("body of {title}"),
            label.to_string(),
            format!("https://example.com/{title}"),
        )
    }

    #[tokio::test]
    async fn test_missing_ledger_is_created_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        let entries = store.load_ledger(LedgerPolicy::Skip).await.unwrap();
        assert!(entries.is_empty());
        assert!(store.ledger_path().exists());
        assert_eq!(std::fs::read_to_string(store.ledger_path()).unwrap(), "");
    }

    #[tokio::test]
    async fn test_ledger_round_trip_keeps_prior_entries_and_order() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        std::fs::write(
            store.ledger_path(),
            "{\"title\": \"A\", \"label\": \"Sports\"}\n",
        )
        .unwrap();

        let appended = vec![
            ScrapedTitleEntry::new("C", "Droit"),
            ScrapedTitleEntry::new("B", "Sports"),
        ];
        store.append_ledger_entries(&appended).await.unwrap();

        let loaded = store.load_ledger(LedgerPolicy::Abort).await.unwrap();
        assert_eq!(
            loaded,
            vec![
                ScrapedTitleEntry::new("A", "Sports"),
                ScrapedTitleEntry::new("C", "Droit"),
                ScrapedTitleEntry::new("B", "Sports"),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_line_skipped_under_skip_policy() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        std::fs::write(
            store.ledger_path(),
            "{\"title\":\"A\",\"label\":\"Sports\"}\nnot json\n\n{\"title\":\"B\",\"label\":\"Droit\"}\n",
        )
        .unwrap();

        let loaded = store.load_ledger(LedgerPolicy::Skip).await.unwrap();
        assert_eq!(
            loaded,
            vec![
                ScrapedTitleEntry::new("A", "Sports"),
                ScrapedTitleEntry::new("B", "Droit"),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_line_aborts_under_abort_policy() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        std::fs::write(
            store.ledger_path(),
            "{\"title\":\"A\",\"label\":\"Sports\"}\n{\"title\":\"B\"}\n",
        )
        .unwrap();

        let err = store.load_ledger(LedgerPolicy::Abort).await.unwrap_err();
        assert!(matches!(err, CrawlError::CorruptLedgerEntry { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_append_articles_never_truncates() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        store.append_articles(&[record("A", "Sports")]).await.unwrap();
        store
            .append_articles(&[record("B", "Sports"), record("C", "Droit")])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.data_path()).unwrap();
        let titles: Vec<String> = raw
            .lines()
            .map(|l| serde_json::from_str::<ArticleRecord>(l).unwrap().title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert!(raw.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_empty_append_creates_file_without_lines() {
        let dir = tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        store.append_articles(&[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(store.data_path()).unwrap(), "");
    }
}
