//! Crawl orchestration.
//!
//! One run walks a fixed sequence of phases over a single browser session:
//!
//! 1. **Login**: load the entry page, fill the credentials, submit. Still
//!    being on the entry URL afterwards means the platform bounced us back,
//!    and the run aborts with [`CrawlError::AuthenticationFailed`].
//! 2. **Per keyword**, in order:
//!    - **Search**: fixed date-range and source filters, keyword typed into
//!      the cleared search field, submit.
//!    - **Scroll**: a fixed number of scroll-to-bottom passes to make the
//!      infinite-scroll listing load more results.
//!    - **Collect**: snapshot the rendered result links as [`ListingLink`]s.
//!    - **Visit**: for each link not already in the ledger, click through,
//!      extract and filter the article, then go back to the listing.
//! 3. **Persist**: append the run's batch to the data file, then its titles
//!    to the ledger.
//!
//! Every wait is a fixed pause from [`Delays`](crate::config::Delays).
//! [`crawl`] owns the session and closes it whatever the outcome, including
//! interruption; nothing is persisted unless every keyword completed, and an
//! interruption arriving after that point no longer stops persistence.

use crate::browser::{BrowserSession, ListingLink};
use crate::config::RunConfiguration;
use crate::error::{CrawlError, Result};
use crate::extract::{ContentExtractor, word_count};
use crate::gate::{Batch, Candidate, FilterGate, Rejection};
use crate::models::ScrapedTitleEntry;
use crate::store::RecordStore;
use crate::utils::truncate_for_log;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// What happened to the links of one keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordReport {
    pub keyword: String,
    /// Links in the snapshot taken after scrolling.
    pub links_found: usize,
    /// Article pages actually opened.
    pub visited: usize,
    pub accepted: usize,
    pub already_scraped: usize,
    pub rejected_length: usize,
    pub rejected_duplicate: usize,
    /// Article pages without a content container.
    pub no_content: usize,
    /// Snapshot links no longer present on the listing when their turn came.
    pub unresolved: usize,
}

impl KeywordReport {
    fn new(keyword: &str, links_found: usize) -> Self {
        Self {
            keyword: keyword.to_string(),
            links_found,
            ..Self::default()
        }
    }

    fn record_rejection(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::AlreadyScraped => self.already_scraped += 1,
            Rejection::Length { .. } => self.rejected_length += 1,
            Rejection::DuplicateContent => self.rejected_duplicate += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub keywords: Vec<KeywordReport>,
    /// Records appended to the data file (and titles to the ledger).
    pub persisted: usize,
}

/// Run a whole crawl, close `session`, then persist the batch.
///
/// Login and the keyword passes are raced against `shutdown`; if `shutdown`
/// completes first the run stops with [`CrawlError::Interrupted`] and nothing
/// is persisted. Once every keyword has completed, `shutdown` is dropped and
/// persistence always runs to the end, so the data file and the ledger grow
/// together. The session is closed on every path, before persisting. A
/// failure to close is logged and does not replace the crawl's own outcome.
pub async fn crawl<B, F>(
    session: B,
    config: &RunConfiguration,
    store: &RecordStore,
    ledger: Vec<ScrapedTitleEntry>,
    shutdown: F,
) -> Result<CrawlReport>
where
    B: BrowserSession,
    F: Future<Output = ()>,
{
    let gathered = tokio::select! {
        res = gather(&session, config, ledger) => res,
        _ = shutdown => {
            warn!("Shutdown requested; abandoning the run without persisting");
            Err(CrawlError::Interrupted)
        }
    };

    if let Err(e) = session.close().await {
        warn!(error = %e, "Browser session did not close cleanly");
    }

    let outcome = match gathered {
        Ok((keywords, batch)) => persist(store, &batch).await.map(|()| CrawlReport {
            keywords,
            persisted: batch.len(),
        }),
        Err(e) => Err(e),
    };
    if let Err(e) = &outcome {
        error!(error = %e, "Crawl aborted");
    }
    outcome
}

/// Log in and run every keyword pass, returning the per-keyword reports and
/// the accepted batch.
async fn gather<B: BrowserSession>(
    session: &B,
    config: &RunConfiguration,
    ledger: Vec<ScrapedTitleEntry>,
) -> Result<(Vec<KeywordReport>, Batch)> {
    let mut crawler = Crawler {
        session,
        config,
        extractor: ContentExtractor::new(&config.site)?,
        gate: FilterGate::new(ledger, config.min_words, config.max_words),
    };

    crawler.login().await?;

    let mut keywords = Vec::with_capacity(config.keywords.len());
    for keyword in &config.keywords {
        keywords.push(crawler.crawl_keyword(keyword).await?);
    }

    Ok((keywords, crawler.gate.into_batch()))
}

/// Append the batch to the data file, then its titles to the ledger.
#[instrument(level = "info", skip_all, fields(records = batch.len()))]
async fn persist(store: &RecordStore, batch: &Batch) -> Result<()> {
    if batch.is_empty() {
        info!("No new articles this run");
    }
    store.append_articles(batch.records()).await?;
    store.append_ledger_entries(&batch.ledger_entries()).await?;
    info!("Run persisted");
    Ok(())
}

/// URL equality after parsing, so host case and an implied `/` path do not
/// matter. Unparseable input falls back to comparing the raw strings.
fn same_page(current: &str, entry: &str) -> bool {
    match (Url::parse(current), Url::parse(entry)) {
        (Ok(current), Ok(entry)) => current == entry,
        _ => current == entry,
    }
}

struct Crawler<'a, B> {
    session: &'a B,
    config: &'a RunConfiguration,
    extractor: ContentExtractor,
    gate: FilterGate,
}

impl<B: BrowserSession> Crawler<'_, B> {
    #[instrument(level = "info", skip_all, fields(url = %self.config.entry_url))]
    async fn login(&self) -> Result<()> {
        let site = &self.config.site;
        let delays = &self.config.delays;
        let credentials = &self.config.credentials;

        self.session.navigate(&self.config.entry_url).await?;
        sleep(delays.login).await;

        self.session.fill(&site.login_field, &credentials.login).await?;
        self.session
            .fill(&site.password_field, &credentials.password)
            .await?;
        self.session.submit_form(&site.login_form).await?;
        sleep(delays.login).await;

        let current = self.session.current_url().await?;
        if same_page(&current, &self.config.entry_url) {
            error!(login = %credentials.login, "Login failed: wrong login or password");
            return Err(CrawlError::AuthenticationFailed { url: current });
        }

        info!(%current, "Logged in");
        sleep(delays.settle).await;
        Ok(())
    }

    #[instrument(level = "info", skip(self))]
    async fn crawl_keyword(&mut self, keyword: &str) -> Result<KeywordReport> {
        sleep(self.config.delays.settle).await;
        self.search(keyword).await?;
        self.scroll_results().await?;
        let links = self.collect_links().await?;

        let mut report = KeywordReport::new(keyword, links.len());
        let progress = self.progress_bar(keyword);
        let target = self.config.target_per_keyword;

        for link in &links {
            if self.config.stop_at_target && report.accepted >= target {
                info!(target, "Target count reached; skipping remaining links");
                break;
            }
            self.visit_link(keyword, link, &mut report).await?;
            progress.set_position(report.accepted as u64);
        }
        progress.finish_and_clear();

        if report.accepted < target {
            warn!(
                accepted = report.accepted,
                target, "Listing exhausted before reaching the target count"
            );
        }
        info!(
            links = report.links_found,
            visited = report.visited,
            accepted = report.accepted,
            already_scraped = report.already_scraped,
            rejected_length = report.rejected_length,
            rejected_duplicate = report.rejected_duplicate,
            no_content = report.no_content,
            unresolved = report.unresolved,
            batch_total = self.gate.batch().len(),
            "Keyword pass complete"
        );
        Ok(report)
    }

    async fn search(&self, keyword: &str) -> Result<()> {
        let site = &self.config.site;
        info!("Configuring search");

        self.session
            .select_option(&site.date_range_select, &site.date_range_value)
            .await?;
        self.session
            .select_option(&site.source_select, &site.source_value)
            .await?;
        sleep(self.config.delays.settle).await;

        let query = format!("{}{}", site.keyword_prefix, keyword);
        self.session.fill(&site.search_field, &query).await?;
        self.session.click(&site.search_button).await?;
        sleep(self.config.delays.settle).await;
        Ok(())
    }

    /// Always performs every configured pass; there is no "no new results"
    /// detection.
    async fn scroll_results(&self) -> Result<()> {
        for _ in 0..self.config.scroll_iterations {
            self.session.scroll_to_bottom().await?;
            sleep(self.config.delays.settle).await;
        }
        Ok(())
    }

    async fn collect_links(&self) -> Result<Vec<ListingLink>> {
        let titles = self
            .session
            .link_titles(&self.config.site.result_links)
            .await?;
        info!(count = titles.len(), "Collected result links");

        Ok(titles
            .into_iter()
            .enumerate()
            .map(|(position, title)| ListingLink { position, title })
            .collect())
    }

    #[instrument(level = "info", skip_all, fields(title = %truncate_for_log(&link.title, 80), position = link.position))]
    async fn visit_link(
        &mut self,
        keyword: &str,
        link: &ListingLink,
        report: &mut KeywordReport,
    ) -> Result<()> {
        if self.gate.already_scraped(&link.title, keyword) {
            info!(label = keyword, "Already scraped; not opening");
            report.already_scraped += 1;
            return Ok(());
        }

        let selector = &self.config.site.result_links;
        if !self.session.open_link(selector, link).await? {
            warn!("Link no longer on the listing; skipping");
            report.unresolved += 1;
            return Ok(());
        }
        report.visited += 1;
        sleep(self.config.delays.article).await;

        let html = self.session.page_html().await?;
        let url = self.session.current_url().await?;
        self.judge_article(keyword, link, html, url, report);

        sleep(self.config.delays.before_back).await;
        self.session.back().await?;
        sleep(self.config.delays.after_back).await;
        Ok(())
    }

    fn judge_article(
        &mut self,
        keyword: &str,
        link: &ListingLink,
        html: String,
        url: String,
        report: &mut KeywordReport,
    ) {
        let Some(text) = self.extractor.extract_clean(&html) else {
            warn!(%url, "No content container on article page");
            report.no_content += 1;
            return;
        };

        let words = word_count(&text);
        let candidate = Candidate {
            title: link.title.clone(),
            label: keyword.to_string(),
            text,
            url,
        };
        match self.gate.evaluate(candidate) {
            Ok(record) => {
                info!(words, url = %record.url, "Accepted article");
                report.accepted += 1;
            }
            Err(rejection) => {
                info!(words, reason = %rejection, "Rejected article");
                report.record_rejection(&rejection);
            }
        }
    }

    fn progress_bar(&self, keyword: &str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(self.config.target_per_keyword as u64);
        let style = ProgressStyle::with_template("{msg} [{elapsed_precise}] {bar:40} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(format!("Scraping '{keyword}'"));
        bar.enable_steady_tick(Duration::from_millis(500));
        bar
    }
}
