//! Core data models for the Vigil agent

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level attached to a finding and used as the report threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

impl RiskLevel {
    /// Parses a risk level from a case-insensitive string.
    /// ZAP reports "Informational" alerts, which map to Low.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(RiskLevel::High),
            "medium" => Some(RiskLevel::Medium),
            "low" | "info" | "informational" => Some(RiskLevel::Low),
            _ => None,
        }
    }
}

/// Default risk classification for analysis findings, keyed on category.
/// Scanner findings carry their own risk and do not go through this.
pub fn risk_for_category(category: &str) -> RiskLevel {
    let lower = category.to_lowercase();
    if lower.contains("injection") || lower.contains("xss") {
        RiskLevel::High
    } else if lower.contains("disclosure") {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

/// Which subsystem produced a finding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FindingSource {
    /// Regex pattern database match
    Pattern,
    /// LLM reasoning over page content
    Llm,
    /// External ZAP scan
    Scanner,
}

impl fmt::Display for FindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingSource::Pattern => write!(f, "pattern"),
            FindingSource::Llm => write!(f, "llm"),
            FindingSource::Scanner => write!(f, "scanner"),
        }
    }
}

/// A CVE reference attached to a finding via NVD enrichment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CveReference {
    pub id: String,
    pub description: String,
    pub severity: String,
    pub score: f64,
}

/// A single security observation with risk classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique identifier
    pub id: String,
    /// Short name of the issue
    pub title: String,
    /// Detailed description
    pub description: String,
    /// Category (XSS, CSRF, Information Disclosure, ...)
    pub category: String,
    /// Risk level
    pub risk: RiskLevel,
    /// CWE reference (e.g. CWE-79)
    pub cwe_id: Option<String>,
    /// OWASP Top 10 reference
    pub owasp_category: Option<String>,
    /// Code snippet or other technical evidence
    pub evidence: String,
    /// Approximate line number within the page source
    pub line: Option<u32>,
    /// Suggested fix
    pub fix: Option<String>,
    /// URL the finding was observed on
    pub url: String,
    /// Subsystem that produced the finding
    pub source: FindingSource,
    /// Related CVEs from NVD enrichment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cve_references: Vec<CveReference>,
}

impl Finding {
    /// Creates a new Finding with a generated UUID
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        risk: RiskLevel,
        url: impl Into<String>,
        source: FindingSource,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            risk,
            cwe_id: None,
            owasp_category: None,
            evidence: String::new(),
            line: None,
            fix: None,
            url: url.into(),
            source,
            cve_references: Vec::new(),
        }
    }

    /// Sets the evidence for this finding
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }

    /// Sets the CWE ID for this finding
    pub fn with_cwe(mut self, cwe: impl Into<String>) -> Self {
        self.cwe_id = Some(cwe.into());
        self
    }

    /// Sets the OWASP category for this finding
    pub fn with_owasp(mut self, owasp: impl Into<String>) -> Self {
        self.owasp_category = Some(owasp.into());
        self
    }

    /// Sets the line number within the page source
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the suggested fix
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }
}

/// A form field extracted from a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    pub name: String,
    pub field_type: String,
}

/// A form extracted from a page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageForm {
    pub action: String,
    pub method: String,
    pub fields: Vec<FormField>,
    /// Raw form HTML, kept for fragment-level LLM analysis
    pub html: String,
}

/// Extracted snapshot of a loaded page's structure and content.
/// Produced by the navigator per page load, consumed once, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    /// Final URL after redirects
    pub url: String,
    /// Page title
    pub title: String,
    /// Visible text content
    pub text: String,
    /// Raw HTML source
    pub html: String,
    /// Absolute link URLs found on the page
    pub links: Vec<String>,
    /// Forms with their input fields
    pub forms: Vec<PageForm>,
    /// Inline script bodies
    pub scripts: Vec<String>,
    /// HTML comments
    pub comments: Vec<String>,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            text: String::new(),
            html: String::new(),
            links: Vec::new(),
            forms: Vec::new(),
            scripts: Vec::new(),
            comments: Vec::new(),
        }
    }
}

/// Aggregated result of an agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Target URL
    pub target: String,
    /// Unique scan identifier
    pub scan_id: String,
    /// Run start time (local timezone)
    pub started_at: DateTime<Local>,
    /// Run end time (local timezone)
    pub finished_at: Option<DateTime<Local>>,
    /// Findings at or above the configured risk threshold
    pub findings: Vec<Finding>,
    /// URLs that were visited during the crawl
    pub pages_visited: Vec<String>,
    /// Number of LLM analysis calls made
    pub llm_calls: u64,
    /// Whether the external scanner ran
    pub scanner_executed: bool,
}

impl ScanReport {
    /// Creates a new empty report for a target
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            scan_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
            finished_at: None,
            findings: Vec::new(),
            pages_visited: Vec::new(),
            llm_calls: 0,
            scanner_executed: false,
        }
    }

    /// Returns count of findings at the given risk level
    pub fn count_by_risk(&self, risk: RiskLevel) -> usize {
        self.findings.iter().filter(|f| f.risk == risk).count()
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn risk_parse_maps_informational_to_low() {
        assert_eq!(RiskLevel::parse("Informational"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::parse("HIGH"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("nonsense"), None);
    }

    #[test]
    fn risk_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::Medium).unwrap(),
            "\"medium\""
        );
    }
}
