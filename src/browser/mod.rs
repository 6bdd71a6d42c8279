//! The browser session the orchestrator drives.
//!
//! [`BrowserSession`] is the only capability the crawl needs from a browser.
//! One session is opened per run, borrowed by every orchestrator phase and
//! consumed by [`BrowserSession::close`] when the run ends.
//!
//! # Implementations
//!
//! | Type | Module | Notes |
//! |------|--------|-------|
//! | [`ChromiumSession`](chromium::ChromiumSession) | [`chromium`] | Chrome DevTools Protocol via `chromiumoxide` |
//!
//! # Link identity
//!
//! Result links are read once per keyword, but the listing is reloaded every
//! time the crawler comes back from an article, so element handles taken
//! before the first click are not reused. A [`ListingLink`] stores the
//! position and visible title instead and is re-resolved against the live
//! page with [`resolve_link`] on each visit.

pub mod chromium;

use crate::error::Result;

/// A result link identified by where it was listed and what it said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLink {
    /// Zero-based index among the result links when the snapshot was taken.
    pub position: usize,
    /// Visible label of the link, used as the article title.
    pub title: String,
}

/// Find `link` among the titles currently rendered.
///
/// Prefers the element at the original position if it still carries the
/// same title, then falls back to the first element with that title.
pub fn resolve_link(titles: &[String], link: &ListingLink) -> Option<usize> {
    if titles.get(link.position) == Some(&link.title) {
        return Some(link.position);
    }
    titles.iter().position(|t| *t == link.title)
}

/// Browser operations used by the crawl, addressed by CSS selector.
///
/// Every method acts on the session's single page. Implementations wait for
/// nothing beyond what the underlying command itself waits for; settle
/// delays are the orchestrator's job.
pub trait BrowserSession {
    /// Load `url` in the page.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Clear the input matching `selector`, then type `value` into it.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Set the `<select>` matching `selector` to the option with `value`.
    async fn select_option(&self, selector: &str, value: &str) -> Result<()>;

    /// Submit the form matching `selector`.
    async fn submit_form(&self, selector: &str) -> Result<()>;

    /// Click the element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Scroll to the bottom of the document once.
    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Serialized HTML of the page as currently rendered.
    async fn page_html(&self) -> Result<String>;

    /// Visible text of every element matching `selector`, in document order.
    async fn link_titles(&self, selector: &str) -> Result<Vec<String>>;

    /// Re-resolve `link` among the elements matching `selector` and click it.
    ///
    /// Returns `false` without navigating if the link is no longer rendered.
    async fn open_link(&self, selector: &str, link: &ListingLink) -> Result<bool>;

    /// Go back one entry in the page history.
    async fn back(&self) -> Result<()>;

    /// Terminate the session.
    async fn close(self) -> Result<()>;
}
