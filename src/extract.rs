//! Article text extraction from rendered HTML.
//!
//! The platform renders every article body inside a single container
//! (`div#docText` by default). Extraction takes the text of each paragraph
//! under that container in document order, one paragraph per line, and
//! [`normalize`] then folds the result into a single line whose word count
//! can be measured directly.

use crate::config::SiteProfile;
use crate::error::{CrawlError, Result};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// Any whitespace run that contains at least one newline.
static NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());

/// Compiled selectors for the content container and its paragraphs.
#[derive(Debug)]
pub struct ContentExtractor {
    container: Selector,
    paragraph: Selector,
}

impl ContentExtractor {
    /// Compile the profile's selectors once for the whole run.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Selector`] if either selector does not parse.
    pub fn new(site: &SiteProfile) -> Result<Self> {
        Ok(Self {
            container: parse_selector(&site.content_container)?,
            paragraph: parse_selector(&site.paragraph)?,
        })
    }

    /// Raw paragraph text of the content container, or `None` if the page
    /// has no container.
    ///
    /// Each paragraph is trimmed and paragraphs are joined with `\n`. A
    /// container with no paragraphs yields an empty string, not `None`.
    pub fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let container = document.select(&self.container).next()?;

        let text = container
            .select(&self.paragraph)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .join("\n");
        debug!(bytes = text.len(), "Extracted article paragraphs");
        Some(text)
    }

    /// [`extract`](Self::extract) followed by [`normalize`].
    pub fn extract_clean(&self, html: &str) -> Option<String> {
        self.extract(html).map(|raw| normalize(&raw))
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| CrawlError::Selector(css.to_string()))
}

/// Collapse every whitespace run containing a newline into one space, then
/// trim both ends.
///
/// The output contains no newlines, so applying it twice changes nothing.
pub fn normalize(raw: &str) -> String {
    NEWLINE_RUN.replace_all(raw, " ").trim().to_string()
}

/// Number of maximal non-whitespace runs.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
