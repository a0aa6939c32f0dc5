//! NVD enrichment
//!
//! Looks up recent CVEs for a finding's CWE against the NVD 2.0 REST API
//! and attaches them as references. Lookups are cached per CWE for the
//! duration of a run; failures leave findings unenriched.

use crate::error::Result;
use crate::models::{CveReference, Finding};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://services.nvd.nist.gov/rest/json/cves/2.0";
const RESULTS_PER_CWE: u32 = 5;

#[derive(Deserialize)]
struct NvdResponse {
    #[serde(default)]
    vulnerabilities: Vec<NvdVulnerability>,
}

#[derive(Deserialize)]
struct NvdVulnerability {
    cve: NvdCve,
}

#[derive(Deserialize)]
struct NvdCve {
    #[serde(default)]
    id: String,
    #[serde(default)]
    descriptions: Vec<NvdDescription>,
    #[serde(default)]
    metrics: NvdMetrics,
}

#[derive(Deserialize)]
struct NvdDescription {
    lang: String,
    value: String,
}

#[derive(Deserialize, Default)]
struct NvdMetrics {
    #[serde(rename = "cvssMetricV31", default)]
    cvss_v31: Vec<NvdCvssMetric>,
    #[serde(rename = "cvssMetricV30", default)]
    cvss_v30: Vec<NvdCvssMetric>,
}

#[derive(Deserialize)]
struct NvdCvssMetric {
    #[serde(rename = "cvssData")]
    cvss_data: NvdCvssData,
}

#[derive(Deserialize)]
struct NvdCvssData {
    #[serde(rename = "baseSeverity", default)]
    base_severity: String,
    #[serde(rename = "baseScore", default)]
    base_score: f64,
}

/// NVD API client with a per-run CWE cache
pub struct NvdClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    cache: Mutex<HashMap<String, Vec<CveReference>>>,
}

impl NvdClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Used by tests to point the client at a mock server
    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Fetches example CVEs for a CWE id like "CWE-79", cached per run
    pub async fn cves_for_cwe(&self, cwe_id: &str) -> Vec<CveReference> {
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(cwe_id) {
                return cached.clone();
            }
        }

        let references = match self.fetch(cwe_id).await {
            Ok(refs) => refs,
            Err(e) => {
                warn!("NVD lookup for {cwe_id} failed: {e}");
                Vec::new()
            }
        };

        self.cache
            .lock()
            .await
            .insert(cwe_id.to_string(), references.clone());
        references
    }

    /// Attaches CVE references to every finding that carries a CWE id
    pub async fn enrich(&self, findings: &mut [Finding]) {
        for finding in findings.iter_mut() {
            let Some(cwe) = finding.cwe_id.clone() else {
                continue;
            };
            finding.cve_references = self.cves_for_cwe(&cwe).await;
        }
    }

    async fn fetch(&self, cwe_id: &str) -> Result<Vec<CveReference>> {
        let mut request = self.client.get(&self.base_url).query(&[
            ("cweName", cwe_id),
            ("resultsPerPage", &RESULTS_PER_CWE.to_string()),
        ]);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("apiKey", key.as_str())]);
        }

        let response = request.send().await?.error_for_status()?;
        let parsed: NvdResponse = response.json().await?;

        let references: Vec<CveReference> = parsed
            .vulnerabilities
            .into_iter()
            .map(|vuln| {
                let description = vuln
                    .cve
                    .descriptions
                    .iter()
                    .find(|d| d.lang == "en")
                    .map(|d| d.value.clone())
                    .unwrap_or_default();
                let (severity, score) = vuln
                    .cve
                    .metrics
                    .cvss_v31
                    .first()
                    .or(vuln.cve.metrics.cvss_v30.first())
                    .map(|m| (m.cvss_data.base_severity.clone(), m.cvss_data.base_score))
                    .unwrap_or_else(|| ("Unknown".to_string(), 0.0));
                CveReference {
                    id: vuln.cve.id,
                    description,
                    severity,
                    score,
                }
            })
            .collect();

        debug!("NVD returned {} CVEs for {cwe_id}", references.len());
        Ok(references)
    }
}
