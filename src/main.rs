//! # Keyword Corpus Crawler
//!
//! Builds a labeled text corpus from a login-gated content-search platform.
//! Each search keyword doubles as the label of the articles it finds, and the
//! results are appended as JSON Lines for training and testing a text
//! classifier.
//!
//! ## Usage
//!
//! ```sh
//! keyword_corpus_crawler --start-url https://portal.example.com/login \
//!     --login me --password secret --keywords Sports Santé
//! ```
//!
//! ## Architecture
//!
//! 1. **Ledger**: load the titles collected by earlier runs
//! 2. **Session**: launch one Chromium session for the whole run
//! 3. **Crawl**: log in, then search, scroll, and visit articles keyword by keyword
//! 4. **Persist**: append accepted articles and their titles to the output folder
//!
//! The browser session is closed on every exit path, including Ctrl-C.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod crawler;
mod error;
mod extract;
mod gate;
mod models;
mod store;
mod utils;

use browser::chromium::ChromiumSession;
use cli::Cli;
use config::RunConfiguration;
use store::RecordStore;
use utils::prepare_output_folder;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("keyword_corpus_crawler starting up");

    let args = Cli::parse();
    let config = RunConfiguration::from_cli(args).await?;
    debug!(?config, "Resolved run configuration");

    // A failure here is already logged; the store reports it again on first access.
    let _ = prepare_output_folder(&config.output_folder).await;

    let store = RecordStore::new(&config.output_folder);
    let ledger = store.load_ledger(config.ledger_policy).await?;

    let session = match ChromiumSession::launch(&config.browser).await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Could not start the browser");
            return Err(e.into());
        }
    };

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available: never resolve.
            std::future::pending::<()>().await;
        }
    };

    let report = crawler::crawl(session, &config, &store, ledger, shutdown).await?;

    for kw in &report.keywords {
        info!(
            keyword = %kw.keyword,
            accepted = kw.accepted,
            visited = kw.visited,
            links = kw.links_found,
            "Keyword summary"
        );
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        persisted = report.persisted,
        data_file = %store.data_path().display(),
        "Execution complete"
    );

    Ok(())
}
