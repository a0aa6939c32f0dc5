//! Parsing of structured model output
//!
//! The analysis prompt asks the model to report issues as numbered
//! `VULNERABILITY N:` blocks with `Key: value` lines, or the sentinel
//! `NO_VULNERABILITIES_FOUND`. Anything unparseable yields no findings.

use crate::models::{risk_for_category, Finding, FindingSource};
use tracing::debug;

/// Sentinel the model emits when a page is clean
pub const NO_VULNERABILITIES: &str = "NO_VULNERABILITIES_FOUND";

/// A vulnerability block parsed from model output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedVulnerability {
    pub vuln_type: String,
    pub subtype: Option<String>,
    pub cwe: Option<String>,
    pub code: Option<String>,
    pub line: Option<u32>,
    pub description: String,
    pub fix: Option<String>,
}

/// Parses a raw model response into vulnerability blocks.
/// Blocks missing a type or description are dropped.
pub fn parse_response(response: &str) -> Vec<ParsedVulnerability> {
    if response.contains(NO_VULNERABILITIES) {
        return Vec::new();
    }

    let mut results = Vec::new();

    for section in response.split("VULNERABILITY ").skip(1) {
        let mut vuln = ParsedVulnerability::default();

        for line in section.lines() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("Type:") {
                vuln.vuln_type = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("Subtype:") {
                vuln.subtype = non_empty(value);
            } else if let Some(value) = line.strip_prefix("CWE:") {
                vuln.cwe = non_empty(value).map(normalize_cwe);
            } else if let Some(value) = line.strip_prefix("Code:") {
                vuln.code = non_empty(value);
            } else if let Some(value) = line.strip_prefix("Line:") {
                vuln.line = value.trim().parse().ok();
            } else if let Some(value) = line.strip_prefix("Description:") {
                vuln.description = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("Fix:") {
                vuln.fix = non_empty(value);
            }
        }

        if vuln.vuln_type.is_empty() || vuln.description.is_empty() {
            debug!("Dropping incomplete vulnerability block");
            continue;
        }
        results.push(vuln);
    }

    results
}

/// Converts parsed blocks into findings for a page URL
pub fn to_findings(parsed: Vec<ParsedVulnerability>, url: &str) -> Vec<Finding> {
    parsed
        .into_iter()
        .map(|vuln| {
            let title = vuln
                .subtype
                .clone()
                .unwrap_or_else(|| vuln.vuln_type.clone());
            let risk = risk_for_category(&vuln.vuln_type);
            let mut finding = Finding::new(
                title,
                vuln.description,
                vuln.vuln_type,
                risk,
                url,
                FindingSource::Llm,
            );
            if let Some(cwe) = vuln.cwe {
                finding = finding.with_cwe(cwe);
            }
            if let Some(code) = vuln.code {
                finding = finding.with_evidence(code);
            }
            if let Some(line) = vuln.line {
                finding = finding.with_line(line);
            }
            if let Some(fix) = vuln.fix {
                finding = finding.with_fix(fix);
            }
            finding
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Accepts "79", "CWE-79" or "cwe-79" and yields "CWE-79"
fn normalize_cwe(raw: String) -> String {
    let stripped = raw
        .trim()
        .strip_prefix("CWE-")
        .or_else(|| raw.trim().strip_prefix("cwe-"))
        .unwrap_or(raw.trim());
    format!("CWE-{stripped}")
}
