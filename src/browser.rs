use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

/// How often [`PageDriver::wait_for_element`] re-queries the DOM.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A Chromium process with a single tab, reused for every navigation of
/// the run: the portal, the channel listing and each player page are
/// visited sequentially through the same tab.
///
/// The driver is acquired once at startup and must be [`close`]d on every
/// exit path before the process terminates.
///
/// [`close`]: PageDriver::close
pub struct PageDriver {
    browser: Browser,
    page: Page,
    event_loop: JoinHandle<()>,
}

impl PageDriver {
    /// Launches Chromium and opens the tab used for scraping.
    pub async fn launch(user_agent: &str, headful: bool) -> Result<Self> {
        let mut config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 720)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={user_agent}"));
        if headful {
            config = config.with_head();
        }
        let config = config.build().map_err(|e| anyhow!(e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Launching Chromium")?;
        let event_loop = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Opening browser tab")?;

        Ok(Self {
            browser,
            page,
            event_loop,
        })
    }

    /// Navigates the tab and waits for the document to load, bounded by
    /// `limit`. Each navigation is attempted exactly once.
    pub async fn navigate(&self, url: &str, limit: Duration) -> Result<()> {
        timeout(limit, async {
            self.page.goto(url).await?.wait_for_navigation().await?;
            Ok::<_, CdpError>(())
        })
        .await
        .map_err(|_| anyhow!("navigation timed out after {limit:?}"))?
        .with_context(|| format!("Navigating to {url}"))?;

        debug!("Loaded {url}");
        Ok(())
    }

    /// Polls the DOM until `selector` matches or `limit` elapses.
    pub async fn wait_for_element(&self, selector: &str, limit: Duration) -> Result<Element> {
        let deadline = Instant::now() + limit;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                bail!("timed out after {limit:?} waiting for `{selector}`");
            }
            sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    /// All elements currently matching `selector`.
    pub async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.page
            .find_elements(selector)
            .await
            .with_context(|| format!("Querying `{selector}`"))
    }

    /// The fully rendered markup of the current document.
    pub async fn content(&self) -> Result<String> {
        self.page.content().await.context("Reading page content")
    }

    /// Shuts the browser process down and stops its event loop.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.context("Closing browser")?;
        self.browser
            .wait()
            .await
            .context("Waiting for browser shutdown")?;
        self.event_loop.abort();
        Ok(())
    }
}
