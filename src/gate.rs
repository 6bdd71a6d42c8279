//! Accept/reject decisions for candidate articles.
//!
//! Checks run in a fixed order: prior ledger, word-count bounds, then the
//! content hash against what this run has already accepted. The ledger check
//! is also exposed on its own so the orchestrator can apply it to a listing
//! title before paying for the click-through.

use crate::extract::word_count;
use crate::models::{ArticleRecord, ScrapedTitleEntry};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    AlreadyScraped,
    /// Word count outside the exclusive bounds.
    Length { words: usize },
    DuplicateContent,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::AlreadyScraped => write!(f, "already scraped"),
            Rejection::Length { words } => write!(f, "length out of bounds ({words} words)"),
            Rejection::DuplicateContent => write!(f, "duplicate content in this run"),
        }
    }
}

/// A fully extracted article waiting for a verdict.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub label: String,
    pub text: String,
    pub url: String,
}

/// Records accepted during the current run, in acceptance order.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<ArticleRecord>,
    hashes: HashSet<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    /// One ledger entry per accepted record, same order.
    pub fn ledger_entries(&self) -> Vec<ScrapedTitleEntry> {
        self.records.iter().map(ArticleRecord::ledger_entry).collect()
    }

    fn contains_hash(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    fn push(&mut self, record: ArticleRecord) {
        self.hashes.insert(record.content_hash.clone());
        self.records.push(record);
    }
}

#[derive(Debug)]
pub struct FilterGate {
    ledger: HashSet<ScrapedTitleEntry>,
    min_words: usize,
    max_words: usize,
    batch: Batch,
}

impl FilterGate {
    pub fn new(ledger: Vec<ScrapedTitleEntry>, min_words: usize, max_words: usize) -> Self {
        Self {
            ledger: ledger.into_iter().collect(),
            min_words,
            max_words,
            batch: Batch::default(),
        }
    }

    /// Whether `(title, label)` was in the ledger loaded at run start.
    pub fn already_scraped(&self, title: &str, label: &str) -> bool {
        self.ledger
            .contains(&ScrapedTitleEntry::new(title.to_string(), label.to_string()))
    }

    /// Run every check in order; on success the record joins the batch.
    pub fn evaluate(&mut self, candidate: Candidate) -> Result<&ArticleRecord, Rejection> {
        if self.already_scraped(&candidate.title, &candidate.label) {
            return Err(Rejection::AlreadyScraped);
        }

        let words = word_count(&candidate.text);
        if !(self.min_words < words && words < self.max_words) {
            return Err(Rejection::Length { words });
        }

        let record = ArticleRecord::new(
            candidate.title,
            candidate.text,
            candidate.label,
            candidate.url,
        );
        if self.batch.contains_hash(&record.content_hash) {
            return Err(Rejection::DuplicateContent);
        }

        self.batch.push(record);
        Ok(&self.batch.records[self.batch.records.len() - 1])
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn into_batch(self) -> Batch {
        self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content_hash;

    fn words(n: usize) -> String {
        vec!["mot"; n].join(" ")
    }

    fn candidate(title: &str, label: &str, text: String) -> Candidate {
        Candidate {
            title: title.to_string(),
            label: label.to_string(),
            text,
            url: format!("https://example.com/{title}"),
        }
    }

    #[test]
    fn test_ledger_match_rejected_first() {
        let mut gate = FilterGate::new(vec![ScrapedTitleEntry::new("A", "Sports")], 100, 500);

        assert!(gate.already_scraped("A", "Sports"));
        assert!(!gate.already_scraped("A", "Droit"));
        // Even text that would fail the length check reports the ledger reason.
        assert_eq!(
            gate.evaluate(candidate("A", "Sports", words(3))).unwrap_err(),
            Rejection::AlreadyScraped
        );
    }

    #[test]
    fn test_length_bounds_are_exclusive() {
        let mut gate = FilterGate::new(vec![], 100, 500);

        assert_eq!(
            gate.evaluate(candidate("low", "Sports", words(100))).unwrap_err(),
            Rejection::Length { words: 100 }
        );
        assert_eq!(
            gate.evaluate(candidate("high", "Sports", words(500))).unwrap_err(),
            Rejection::Length { words: 500 }
        );
        assert!(gate.evaluate(candidate("min+1", "Sports", words(101))).is_ok());
        assert!(gate.evaluate(candidate("max-1", "Sports", words(499))).is_ok());
        assert_eq!(gate.batch().len(), 2);
    }

    #[test]
    fn test_duplicate_hash_rejected_within_run() {
        let mut gate = FilterGate::new(vec![], 1, 10);

        let first = gate
            .evaluate(candidate("T", "Sports", words(5)))
            .unwrap()
            .clone();
        assert_eq!(first.content_hash, content_hash("T", &words(5), "Sports"));
        assert_eq!(
            gate.evaluate(candidate("T", "Sports", words(5))).unwrap_err(),
            Rejection::DuplicateContent
        );
        // Same text under another title hashes differently.
        assert!(gate.evaluate(candidate("U", "Sports", words(5))).is_ok());
    }

    #[test]
    fn test_accepted_hashes_pairwise_distinct() {
        let mut gate = FilterGate::new(vec![], 0, 50);
        for i in 0..20 {
            let title = format!("t{}", i % 7);
            let _ = gate.evaluate(candidate(&title, "Sports", words(1 + i % 3)));
        }

        let hashes: HashSet<&str> = gate
            .batch()
            .records()
            .iter()
            .map(|r| r.content_hash.as_str())
            .collect();
        assert_eq!(hashes.len(), gate.batch().len());
    }

    #[test]
    fn test_batch_ledger_entries_follow_acceptance_order() {
        let mut gate = FilterGate::new(vec![], 0, 50);
        gate.evaluate(candidate("B", "Sports", words(3))).unwrap();
        gate.evaluate(candidate("A", "Droit", words(4))).unwrap();

        let batch = gate.into_batch();
        assert_eq!(
            batch.ledger_entries(),
            vec![
                ScrapedTitleEntry::new("B", "Sports"),
                ScrapedTitleEntry::new("A", "Droit"),
            ]
        );
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(Rejection::AlreadyScraped.to_string(), "already scraped");
        assert_eq!(
            Rejection::Length { words: 42 }.to_string(),
            "length out of bounds (42 words)"
        );
    }
}
