//! Headless-Chromium navigator
//!
//! Renders JavaScript-heavy pages before extraction. Only available with
//! the `browser` feature.

#[cfg(feature = "browser")]
use crate::config::NavigatorConfig;
#[cfg(feature = "browser")]
use crate::error::{Result, VigilError};
#[cfg(feature = "browser")]
use crate::models::PageContext;
#[cfg(feature = "browser")]
use crate::navigator::{extractor, Navigate};
#[cfg(feature = "browser")]
use async_trait::async_trait;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use std::time::Duration;
#[cfg(feature = "browser")]
use tokio::sync::Mutex;
#[cfg(feature = "browser")]
use tracing::{debug, info};
#[cfg(feature = "browser")]
use url::Url;

/// Browser-based navigator driving a Chromium session
#[cfg(feature = "browser")]
pub struct BrowserNavigator {
    browser: Mutex<Browser>,
    timeout_ms: u64,
    render_wait_ms: u64,
}

#[cfg(feature = "browser")]
impl BrowserNavigator {
    /// Launches a Chromium session per configuration
    pub async fn launch(config: &NavigatorConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| VigilError::ConfigError(format!("browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| VigilError::NavigationError {
                url: String::new(),
                reason: format!("failed to launch browser: {e}"),
            })?;

        tokio::spawn(async move { while handler.next().await.is_some() {} });

        info!("Browser session launched (headless: {})", config.headless);
        Ok(Self {
            browser: Mutex::new(browser),
            timeout_ms: config.timeout,
            render_wait_ms: config.render_wait_ms,
        })
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl Navigate for BrowserNavigator {
    async fn navigate_to(&self, url: &str) -> Result<PageContext> {
        let parsed = Url::parse(url)?;

        let load = async {
            let browser = self.browser.lock().await;
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| VigilError::NavigationError {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            // Let client-side rendering settle before reading the DOM
            tokio::time::sleep(Duration::from_millis(self.render_wait_ms)).await;

            let html = page
                .content()
                .await
                .map_err(|e| VigilError::NavigationError {
                    url: url.to_string(),
                    reason: format!("failed to read DOM: {e}"),
                })?;
            let _ = page.close().await;
            Ok::<String, VigilError>(html)
        };

        let html = tokio::time::timeout(Duration::from_millis(self.timeout_ms), load)
            .await
            .map_err(|_| VigilError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: self.timeout_ms,
            })??;

        debug!("Rendered {url}: {} bytes", html.len());
        Ok(extractor::build_page_context(&parsed, &html))
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| VigilError::NavigationError {
                url: String::new(),
                reason: format!("failed to close browser: {e}"),
            })?;
        Ok(())
    }
}
