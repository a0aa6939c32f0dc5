//! ZAP JSON API client
//!
//! Thin wrapper over the daemon's HTTP interface: spider and active-scan
//! actions, their status views, and the alerts view.

use crate::error::{Result, VigilError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// An alert as reported by the ZAP alerts view
#[derive(Debug, Clone, Deserialize)]
pub struct ZapAlert {
    #[serde(alias = "alert", default)]
    pub name: String,
    #[serde(default)]
    pub risk: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub cweid: String,
}

#[derive(Deserialize)]
struct ScanStarted {
    scan: String,
}

#[derive(Deserialize)]
struct ScanStatus {
    status: String,
}

#[derive(Deserialize)]
struct AlertsView {
    #[serde(default)]
    alerts: Vec<ZapAlert>,
}

#[derive(Deserialize)]
struct VersionView {
    version: String,
}

/// HTTP client for a ZAP daemon
pub struct ZapClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ZapClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self
            .client
            .get(format!("{}{path}", self.endpoint))
            .query(params);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| VigilError::ScanError(format!("ZAP request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(VigilError::ScanError(format!(
                "ZAP answered {status} for {path}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| VigilError::ScanError(format!("malformed ZAP response for {path}: {e}")))
    }

    /// Probes the daemon, returning its version
    pub async fn version(&self) -> Result<String> {
        let view: VersionView = self.call("/JSON/core/view/version/", &[]).await?;
        Ok(view.version)
    }

    /// Starts a spider scan, returning the scan id
    pub async fn start_spider(&self, target: &str) -> Result<String> {
        let started: ScanStarted = self
            .call("/JSON/spider/action/scan/", &[("url", target)])
            .await?;
        Ok(started.scan)
    }

    /// Spider progress, 0..=100
    pub async fn spider_status(&self, scan_id: &str) -> Result<u8> {
        let status: ScanStatus = self
            .call("/JSON/spider/view/status/", &[("scanId", scan_id)])
            .await?;
        parse_progress(&status.status)
    }

    /// Starts an active scan, returning the scan id
    pub async fn start_active_scan(&self, target: &str) -> Result<String> {
        let started: ScanStarted = self
            .call("/JSON/ascan/action/scan/", &[("url", target)])
            .await?;
        Ok(started.scan)
    }

    /// Active scan progress, 0..=100
    pub async fn active_scan_status(&self, scan_id: &str) -> Result<u8> {
        let status: ScanStatus = self
            .call("/JSON/ascan/view/status/", &[("scanId", scan_id)])
            .await?;
        parse_progress(&status.status)
    }

    /// Fetches all alerts recorded for the target
    pub async fn alerts(&self, target: &str) -> Result<Vec<ZapAlert>> {
        let view: AlertsView = self
            .call("/JSON/core/view/alerts/", &[("baseurl", target)])
            .await?;
        Ok(view.alerts)
    }
}

fn parse_progress(raw: &str) -> Result<u8> {
    raw.parse::<u8>()
        .map_err(|_| VigilError::ScanError(format!("unexpected scan status '{raw}'")))
}
