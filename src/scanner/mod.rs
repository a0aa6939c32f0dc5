//! External security scanner façade (OWASP ZAP)
//!
//! Drives a ZAP daemon through its JSON API: spider the target, run an
//! active scan, collect alerts as findings. Blocks until completion or the
//! configured scan timeout. When the daemon is not reachable and a ZAP
//! installation path is configured, the façade spawns the daemon itself and
//! terminates it on shutdown.

pub mod zap;

use crate::config::SecurityConfig;
use crate::error::{Result, VigilError};
use crate::models::{Finding, FindingSource, RiskLevel};
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use zap::{ZapAlert, ZapClient};

const SPAWN_READY_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// ZAP scanner façade
pub struct ZapScanner {
    client: ZapClient,
    scan_timeout: Duration,
    risk_threshold: RiskLevel,
    poll_interval: Duration,
    spawned: Mutex<Option<Child>>,
}

impl ZapScanner {
    /// Connects to the configured daemon, spawning one from
    /// `security.zap_path` when the endpoint is not reachable
    pub async fn connect(config: &SecurityConfig) -> Result<Self> {
        Self::connect_with_ready_timeout(config, SPAWN_READY_TIMEOUT).await
    }

    /// Like [`connect`](Self::connect) with a custom readiness wait for a
    /// spawned daemon; used by tests against a stub daemon
    pub async fn connect_with_ready_timeout(
        config: &SecurityConfig,
        ready_timeout: Duration,
    ) -> Result<Self> {
        let client = ZapClient::new(&config.zap_endpoint, config.zap_api_key.clone())?;

        let mut spawned = None;
        match client.version().await {
            Ok(version) => {
                info!("ZAP daemon reachable at {} (v{version})", config.zap_endpoint);
            }
            Err(probe_err) => {
                let Some(ref zap_path) = config.zap_path else {
                    return Err(VigilError::ScannerUnavailable(format!(
                        "{} not reachable and no zap_path configured: {probe_err}",
                        config.zap_endpoint
                    )));
                };
                spawned = Some(
                    Self::spawn_daemon(zap_path, &config.zap_endpoint, &client, ready_timeout)
                        .await?,
                );
            }
        }

        Ok(Self {
            client,
            scan_timeout: Duration::from_secs(config.scan_timeout),
            risk_threshold: config.risk_threshold,
            poll_interval: DEFAULT_POLL_INTERVAL,
            spawned: Mutex::new(spawned),
        })
    }

    /// Shortens the status poll interval; used by tests against a mock API
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn spawn_daemon(
        zap_path: &str,
        endpoint: &str,
        client: &ZapClient,
        ready_timeout: Duration,
    ) -> Result<Child> {
        let port = Url::parse(endpoint)?
            .port_or_known_default()
            .unwrap_or(8080);

        info!("Spawning ZAP daemon from {zap_path} on port {port}");
        let child = Command::new(zap_path)
            .args([
                "-daemon",
                "-port",
                &port.to_string(),
                "-config",
                "api.disablekey=true",
            ])
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                VigilError::ScannerUnavailable(format!("failed to spawn {zap_path}: {e}"))
            })?;

        let deadline = Instant::now() + ready_timeout;
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if client.version().await.is_ok() {
                info!("ZAP daemon ready");
                return Ok(child);
            }
            if Instant::now() >= deadline {
                // Dropping the child kills it (kill_on_drop)
                return Err(VigilError::ScannerUnavailable(format!(
                    "spawned daemon did not become ready within {}ms",
                    ready_timeout.as_millis()
                )));
            }
        }
    }

    /// Runs spider plus active scan against the target and returns findings
    /// at or above the configured risk threshold
    pub async fn scan(&self, target: &str) -> Result<Vec<Finding>> {
        let deadline = Instant::now() + self.scan_timeout;

        let spider_id = self.client.start_spider(target).await?;
        debug!("Spider scan {spider_id} started for {target}");
        self.wait_for_completion(&spider_id, deadline, true).await?;

        let ascan_id = self.client.start_active_scan(target).await?;
        debug!("Active scan {ascan_id} started for {target}");
        self.wait_for_completion(&ascan_id, deadline, false).await?;

        let alerts = self.client.alerts(target).await?;
        let total = alerts.len();
        let findings: Vec<Finding> = alerts
            .into_iter()
            .map(alert_to_finding)
            .filter(|f| f.risk >= self.risk_threshold)
            .collect();

        info!(
            "ZAP scan complete: {} alerts, {} at or above {}",
            total,
            findings.len(),
            self.risk_threshold
        );
        Ok(findings)
    }

    async fn wait_for_completion(
        &self,
        scan_id: &str,
        deadline: Instant,
        spider: bool,
    ) -> Result<()> {
        loop {
            let progress = if spider {
                self.client.spider_status(scan_id).await?
            } else {
                self.client.active_scan_status(scan_id).await?
            };
            if progress >= 100 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(VigilError::ScanTimeout(self.scan_timeout.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Terminates a daemon this façade spawned; a pre-existing daemon is
    /// left running
    pub async fn shutdown(&self) {
        let mut guard = self.spawned.lock().await;
        if let Some(mut child) = guard.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to terminate spawned ZAP daemon: {e}");
            }
        }
    }
}

/// Maps a ZAP alert to a finding. Unparseable risk strings default to Low.
fn alert_to_finding(alert: ZapAlert) -> Finding {
    let risk = RiskLevel::parse(&alert.risk).unwrap_or(RiskLevel::Low);
    let mut finding = Finding::new(
        alert.name.clone(),
        alert.description,
        alert.name,
        risk,
        alert.url,
        FindingSource::Scanner,
    )
    .with_evidence(alert.evidence);

    if !alert.solution.is_empty() {
        finding = finding.with_fix(alert.solution);
    }
    if !alert.cweid.is_empty() && alert.cweid != "0" && alert.cweid != "-1" {
        finding = finding.with_cwe(format!("CWE-{}", alert.cweid));
    }
    finding
}
