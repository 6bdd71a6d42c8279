//! [`BrowserSession`] over the Chrome DevTools Protocol.
//!
//! Launches a local Chrome/Chromium with `chromiumoxide`, drives a single
//! tab, and shuts the browser down in [`close`](BrowserSession::close).
//! Form controls the DevTools element API has no direct command for
//! (selects, form submission, history) are handled with small page scripts.

use super::{BrowserSession, ListingLink, resolve_link};
use crate::config::BrowserOptions;
use crate::error::{CrawlError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch the browser and open the session's page.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Browser`] if the browser cannot be configured, launched,
    /// or cannot open a page.
    #[instrument(level = "info", skip_all, fields(headless = options.headless))]
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| CrawlError::Browser(format!("browser config error: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Browser close error after failed page open");
                }
                handler.abort();
                return Err(e.into());
            }
        };

        info!("Browser session started");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Evaluate a script that returns `true` when its target element exists.
    async fn run_on_element(&self, selector: &str, script: String) -> Result<()> {
        let found: bool = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| CrawlError::Browser(format!("unexpected script result: {e}")))?;
        if found {
            Ok(())
        } else {
            Err(CrawlError::Browser(format!("no element matches `{selector}`")))
        }
    }

    /// Elements matching `selector` with their trimmed visible text.
    async fn links(&self, selector: &str) -> Result<(Vec<Element>, Vec<String>)> {
        let elements = self.page.find_elements(selector).await?;
        let mut titles = Vec::with_capacity(elements.len());
        for element in &elements {
            let text = element.inner_text().await?.unwrap_or_default();
            titles.push(text.trim().to_string());
        }
        Ok((elements, titles))
    }
}

/// Quote a value as a JavaScript string literal.
fn js_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Submit the form matched by `selector` on the next tick, running its submit
/// handlers where the page supports `requestSubmit`.
fn submit_script(selector: &str) -> Result<String> {
    Ok(format!(
        "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
         setTimeout(() => el.requestSubmit ? el.requestSubmit() : HTMLFormElement.prototype.submit.call(el), 0); \
         return true; }})()",
        sel = js_string(selector)?
    ))
}

impl BrowserSession for ChromiumSession {
    #[instrument(level = "debug", skip(self))]
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, value))]
    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let clear = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; el.value = ''; return true; }})()",
            sel = js_string(selector)?
        );
        self.run_on_element(selector, clear).await?;
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
             el.value = {val}; el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            sel = js_string(selector)?,
            val = js_string(value)?
        );
        self.run_on_element(selector, script).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn submit_form(&self, selector: &str) -> Result<()> {
        self.run_on_element(selector, submit_script(selector)?).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn click(&self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn page_html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    #[instrument(level = "debug", skip(self))]
    async fn link_titles(&self, selector: &str) -> Result<Vec<String>> {
        let (_, titles) = self.links(selector).await?;
        Ok(titles)
    }

    #[instrument(level = "debug", skip(self, link), fields(title = %link.title, position = link.position))]
    async fn open_link(&self, selector: &str, link: &ListingLink) -> Result<bool> {
        let (elements, titles) = self.links(selector).await?;
        match resolve_link(&titles, link) {
            Some(idx) => {
                elements[idx].click().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn back(&self) -> Result<()> {
        self.page
            .evaluate("setTimeout(() => window.history.back(), 0)")
            .await?;
        Ok(())
    }

    #[instrument(level = "info", skip_all)]
    async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        let waited = self.browser.wait().await;
        self.handler.abort();
        closed?;
        waited?;
        info!("Browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"a[name="x"]"#).unwrap(), r#""a[name=\"x\"]""#);
    }

    #[test]
    fn test_submit_script_prefers_request_submit() {
        let script = submit_script("form#login").unwrap();
        assert!(script.contains(r#"document.querySelector("form#login")"#));
        assert!(script.contains("el.requestSubmit ? el.requestSubmit()"));
        // Fallback bypasses a control named `submit` shadowing the method.
        assert!(script.contains("HTMLFormElement.prototype.submit.call(el)"));
        assert!(!script.contains("el.submit()"));
    }
}
