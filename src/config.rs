//! Run configuration assembled once at startup.
//!
//! [`RunConfiguration`] is built from the parsed [`Cli`] plus an optional
//! YAML site profile, and is read-only for the rest of the run. The site
//! profile holds every selector and fixed form value the orchestrator uses,
//! so pointing the crawler at a re-skinned platform does not need a rebuild.
//!
//! # Site profile file
//!
//! Every field is optional; missing fields keep their defaults:
//!
//! ```yaml
//! content_container: "div#docText"
//! result_links: "ul#container.documentList.items a.docList-links"
//! source_value: "210340"
//! ```

use crate::cli::Cli;
use crate::error::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Selectors and fixed form values for the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Username input on the entry page.
    pub login_field: String,
    /// Password input on the entry page.
    pub password_field: String,
    /// The login form to submit.
    pub login_form: String,
    /// Date-range `<select>` on the search page.
    pub date_range_select: String,
    /// Option value for "all archives".
    pub date_range_value: String,
    /// Source/region `<select>` on the search page.
    pub source_select: String,
    /// Option value for the fixed source filter.
    pub source_value: String,
    /// Keyword search input.
    pub search_field: String,
    /// Text typed before the keyword (a section query on the platform).
    pub keyword_prefix: String,
    /// Search submit button.
    pub search_button: String,
    /// Result link elements on the listing page.
    pub result_links: String,
    /// The element holding the article body.
    pub content_container: String,
    /// Paragraph elements inside the content container.
    pub paragraph: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            login_field: "#user".to_string(),
            password_field: "#pass".to_string(),
            login_form: "form".to_string(),
            date_range_select: "#DateFilter_DateRange".to_string(),
            date_range_value: "9".to_string(),
            source_select: "#CriteriaSet".to_string(),
            source_value: "210340".to_string(),
            search_field: "#Keywords".to_string(),
            keyword_prefix: "SECT=".to_string(),
            search_button: "#btnSearch".to_string(),
            result_links: "ul#container.documentList.items a.docList-links".to_string(),
            content_container: "div#docText".to_string(),
            paragraph: "p".to_string(),
        }
    }
}

impl SiteProfile {
    /// Load a profile from YAML, keeping defaults for absent fields.
    #[instrument(level = "info")]
    pub async fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).await?;
        let profile: SiteProfile = serde_yaml::from_str(&raw)?;
        info!(path, "Loaded site profile");
        Ok(profile)
    }
}

/// Fixed pauses inserted after actions that trigger page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    /// The configurable settle delay (`--latency`), used after search
    /// configuration, search submission, each scroll and after login.
    pub settle: Duration,
    /// Wait after loading the entry page and after submitting credentials.
    pub login: Duration,
    /// Wait after clicking through to an article.
    pub article: Duration,
    /// Wait on the article page before navigating back.
    pub before_back: Duration,
    /// Wait after navigating back to the listing.
    pub after_back: Duration,
}

impl Delays {
    pub fn with_settle(settle: Duration) -> Self {
        Self {
            settle,
            login: Duration::from_secs(2),
            article: Duration::from_secs(2),
            before_back: Duration::from_secs(1),
            after_back: Duration::from_secs(2),
        }
    }

    /// No waiting at all; for driving an in-memory session.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            settle: Duration::ZERO,
            login: Duration::ZERO,
            article: Duration::ZERO,
            before_back: Duration::ZERO,
            after_back: Duration::ZERO,
        }
    }
}

/// What to do with a ledger line that is not a valid entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerPolicy {
    /// Log the line number and keep loading.
    #[default]
    Skip,
    /// Abort the run with [`CrawlError::CorruptLedgerEntry`].
    Abort,
}

#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How the Chromium session is launched.
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
}

/// Everything a run needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub entry_url: String,
    pub credentials: Credentials,
    pub output_folder: PathBuf,
    /// Searched in this order; each one is also the label of its articles.
    pub keywords: Vec<String>,
    pub target_per_keyword: usize,
    /// Exclusive lower word-count bound.
    pub min_words: usize,
    /// Exclusive upper word-count bound.
    pub max_words: usize,
    pub delays: Delays,
    pub scroll_iterations: usize,
    /// Stop visiting a keyword's links once its target count is reached.
    pub stop_at_target: bool,
    pub ledger_policy: LedgerPolicy,
    pub show_progress: bool,
    pub site: SiteProfile,
    pub browser: BrowserOptions,
}

impl RunConfiguration {
    /// Build and validate the configuration from parsed CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] if the entry URL does not parse, the
    /// keyword list is empty, or the word-count bounds leave no accepted
    /// length; I/O or YAML errors if the site profile cannot be loaded.
    pub async fn from_cli(cli: Cli) -> Result<Self> {
        Url::parse(&cli.start_url)
            .map_err(|e| CrawlError::Config(format!("invalid start URL {}: {e}", cli.start_url)))?;

        let site = match cli.config.as_deref() {
            Some(path) => SiteProfile::load(path).await?,
            None => SiteProfile::default(),
        };

        let config = Self {
            entry_url: cli.start_url,
            credentials: Credentials {
                login: cli.login,
                password: cli.password,
            },
            output_folder: PathBuf::from(cli.folder),
            keywords: cli.keywords,
            target_per_keyword: cli.nb_texts_to_scrap,
            min_words: cli.min_length,
            max_words: cli.max_length,
            delays: Delays::with_settle(Duration::from_secs(cli.latency)),
            scroll_iterations: cli.scrolls_number,
            stop_at_target: !cli.visit_all_links,
            ledger_policy: if cli.strict_ledger {
                LedgerPolicy::Abort
            } else {
                LedgerPolicy::Skip
            },
            show_progress: !cli.no_progress,
            site,
            browser: BrowserOptions {
                headless: cli.headless,
                executable: cli.chrome_executable.map(PathBuf::from),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(CrawlError::Config("at least one keyword is required".to_string()));
        }
        // Both bounds are exclusive, so there must be a gap of at least one.
        if self.max_words.saturating_sub(self.min_words) < 2 {
            return Err(CrawlError::Config(format!(
                "no word count lies strictly between {} and {}",
                self.min_words, self.max_words
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "keyword_corpus_crawler",
            "--start-url",
            "https://example.com/login",
            "--login",
            "user",
            "--password",
            "secret",
        ];
        args.extend_from_slice(extra);
        Cli::parse_from(args)
    }

    #[tokio::test]
    async fn test_defaults_from_cli() {
        let config = RunConfiguration::from_cli(cli(&[])).await.unwrap();
        assert_eq!(config.entry_url, "https://example.com/login");
        assert_eq!(config.output_folder, PathBuf::from("data"));
        assert_eq!(config.keywords.len(), 8);
        assert_eq!(config.target_per_keyword, 100);
        assert_eq!((config.min_words, config.max_words), (100, 500));
        assert_eq!(config.delays.settle, Duration::from_secs(4));
        assert_eq!(config.scroll_iterations, 10);
        assert!(config.stop_at_target);
        assert_eq!(config.ledger_policy, LedgerPolicy::Skip);
        assert_eq!(config.site, SiteProfile::default());
    }

    #[tokio::test]
    async fn test_inverted_bounds_rejected() {
        let err = RunConfiguration::from_cli(cli(&["--min-length", "50", "--max-length", "51"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[tokio::test]
    async fn test_huge_min_length_rejected_without_overflow() {
        let max = usize::MAX.to_string();
        let err = RunConfiguration::from_cli(cli(&["--min-length", &max, "--max-length", &max]))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));

        let ok = RunConfiguration::from_cli(cli(&["--min-length", "50", "--max-length", "52"])).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_start_url_rejected() {
        let parsed = Cli::parse_from([
            "keyword_corpus_crawler",
            "--start-url",
            "not a url",
            "--login",
            "u",
            "--password",
            "p",
        ]);
        let err = RunConfiguration::from_cli(parsed).await.unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[tokio::test]
    async fn test_partial_site_profile_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "content_container: \"article.body\"").unwrap();
        writeln!(file, "keyword_prefix: \"\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = RunConfiguration::from_cli(cli(&["--config", &path]))
            .await
            .unwrap();
        assert_eq!(config.site.content_container, "article.body");
        assert_eq!(config.site.keyword_prefix, "");
        assert_eq!(config.site.login_field, "#user");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            login: "user".to_string(),
            password: "hunter2".to_string(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("user"));
        assert!(!printed.contains("hunter2"));
    }
}
