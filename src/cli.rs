//! Command-line interface definitions for the keyword corpus crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The password can also be supplied through the `CRAWLER_PASSWORD`
//! environment variable so it stays out of shell history.

use clap::Parser;

/// Keywords searched when none are given on the command line.
pub const DEFAULT_KEYWORDS: [&str; 8] = [
    "Arts et culture",
    "Droit",
    "Économie",
    "Environnement",
    "Politique et gouvernement",
    "Santé",
    "Sciences et technologie",
    "Sports",
];

/// Command-line arguments for one crawl run.
///
/// # Examples
///
/// ```sh
/// # Crawl two keywords, 50 articles each
/// keyword_corpus_crawler --start-url https://portal.example.com/login \
///     --login me --password secret --keywords Sports Santé --nb-texts-to-scrap 50
///
/// # Headless, with a custom site profile
/// CRAWLER_PASSWORD=secret keyword_corpus_crawler --start-url https://portal.example.com/login \
///     --login me --headless -c site.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Login page URL of the platform
    #[arg(long, alias = "start_urls")]
    pub start_url: String,

    /// Username for the login form
    #[arg(long)]
    pub login: String,

    /// Password for the login form
    #[arg(long, alias = "mdp", env = "CRAWLER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Folder holding the ledger and the data file
    #[arg(long, default_value = "data")]
    pub folder: String,

    /// Keywords to search, in order; each keyword labels its articles
    #[arg(long, num_args = 1.., default_values = DEFAULT_KEYWORDS)]
    pub keywords: Vec<String>,

    /// Number of articles to collect per keyword
    #[arg(long, default_value_t = 100)]
    pub nb_texts_to_scrap: usize,

    /// Articles must have strictly more words than this
    #[arg(long, default_value_t = 100)]
    pub min_length: usize,

    /// Articles must have strictly fewer words than this
    #[arg(long, default_value_t = 500)]
    pub max_length: usize,

    /// Settle delay in seconds after actions that load content
    #[arg(long, default_value_t = 4)]
    pub latency: u64,

    /// Scroll-to-bottom passes per keyword to load more results
    #[arg(long, default_value_t = 10)]
    pub scrolls_number: usize,

    /// Optional path to a YAML site profile overriding selectors
    #[arg(short, long)]
    pub config: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Path to the Chrome/Chromium binary (auto-detected otherwise)
    #[arg(long, env = "CHROME_EXECUTABLE")]
    pub chrome_executable: Option<String>,

    /// Keep visiting links after a keyword's target count is reached
    #[arg(long)]
    pub visit_all_links: bool,

    /// Abort on a malformed ledger line instead of skipping it
    #[arg(long)]
    pub strict_ledger: bool,

    /// Hide the per-keyword progress bar
    #[arg(long)]
    pub no_progress: bool,
}
