//! Navigator façade over page loading
//!
//! Opens pages in a controlled session and extracts their structure into
//! [`PageContext`] snapshots. The default implementation fetches over plain
//! HTTP; a headless-Chromium implementation lives behind the `browser`
//! feature for JavaScript-heavy targets.

pub mod browser;
pub mod extractor;

use crate::config::NavigatorConfig;
use crate::error::{Result, VigilError};
use crate::models::PageContext;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Navigation primitives exposed to the orchestrator
#[async_trait]
pub trait Navigate: Send + Sync {
    /// Loads a page and returns its extracted context. Fails with
    /// [`VigilError::NavigationTimeout`] when the page does not load within
    /// the configured timeout.
    async fn navigate_to(&self, url: &str) -> Result<PageContext>;

    /// Releases the underlying session
    async fn close(&self) -> Result<()>;
}

/// HTTP-based navigator (no JavaScript execution)
pub struct HttpNavigator {
    client: Client,
    timeout_ms: u64,
}

impl HttpNavigator {
    /// Creates a navigator from configuration
    pub fn from_config(config: &NavigatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout))
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            timeout_ms: config.timeout,
        })
    }
}

#[async_trait]
impl Navigate for HttpNavigator {
    async fn navigate_to(&self, url: &str) -> Result<PageContext> {
        let parsed = Url::parse(url)?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                VigilError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else {
                VigilError::NavigationError {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let final_url = response.url().clone();
        let status = response.status();
        // The client timeout also covers the body read
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                VigilError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else {
                VigilError::NavigationError {
                    url: url.to_string(),
                    reason: format!("failed to read body: {e}"),
                }
            }
        })?;

        debug!("Loaded {final_url} ({status}, {} bytes)", body.len());

        Ok(extractor::build_page_context(&final_url, &body))
    }

    async fn close(&self) -> Result<()> {
        // Nothing to release for a plain HTTP session
        Ok(())
    }
}
