//! Rendered page source backed by headless Chrome.

use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;

use super::{check_url, FetchError, PageSource};
use crate::config::ChromeConfig;

/// One browser process with one tab, reused for every page of a run.
pub struct ChromePageSource {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    settle: Duration,
}

impl ChromePageSource {
    /// Starts the browser and opens the tab pages are loaded into.
    pub fn launch(cfg: &ChromeConfig) -> Result<Self, FetchError> {
        let options = LaunchOptions {
            headless: cfg.headless,
            path: cfg.binary.clone(),
            idle_browser_timeout: Duration::from_secs(cfg.idle_timeout_secs),
            ..Default::default()
        };

        let browser = Browser::new(options).map_err(|e| FetchError::Launch(e.into()))?;
        let tab = browser.new_tab().map_err(|e| FetchError::Launch(e.into()))?;
        tab.set_default_timeout(Duration::from_secs(cfg.navigation_timeout_secs));

        tracing::info!(headless = cfg.headless, "browser started");
        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            settle: Duration::from_millis(cfg.settle_millis),
        })
    }
}

impl PageSource for ChromePageSource {
    fn page_source(&mut self, url: &str) -> Result<String, FetchError> {
        check_url(url)?;
        let navigate_err = |e: anyhow::Error| FetchError::Navigate {
            url: url.to_string(),
            source: e.into(),
        };

        let tab = self.tab.as_ref().ok_or_else(|| FetchError::Navigate {
            url: url.to_string(),
            source: "browser already closed".into(),
        })?;

        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(&navigate_err)?;
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        tab.get_content().map_err(&navigate_err)
    }

    fn close(&mut self) -> Result<(), FetchError> {
        let closed = match self.tab.take() {
            Some(tab) => tab.close(true).map(|_| ()).map_err(|e| FetchError::Close(e.into())),
            None => Ok(()),
        };
        // Dropping the browser kills the process even if the tab refused to close.
        if self.browser.take().is_some() {
            tracing::info!("browser stopped");
        }
        closed
    }
}
