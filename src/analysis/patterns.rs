//! Regex vulnerability pattern database
//!
//! Fast first-pass detection over raw page HTML. Each match becomes a
//! finding with a line number and a few lines of surrounding context as
//! evidence. The LLM pass covers what these patterns cannot.

use crate::models::{risk_for_category, Finding, FindingSource};
use regex::Regex;
use std::sync::OnceLock;

struct VulnPattern {
    regex: Regex,
    category: &'static str,
    subtype: &'static str,
    cwe: &'static str,
    owasp: &'static str,
    description: &'static str,
    /// Substring that suppresses the match when present in the snippet
    /// (the regex crate has no lookaheads)
    unless_contains: Option<&'static str>,
}

fn pattern_db() -> &'static [VulnPattern] {
    static DB: OnceLock<Vec<VulnPattern>> = OnceLock::new();
    DB.get_or_init(|| {
        let table: [(&str, &str, &str, &str, &str, &str, Option<&str>); 8] = [
            (
                r"(?is)<script>.*?document\.write\s*\(.*?location.*?\)",
                "XSS",
                "DOM-based XSS",
                "CWE-79",
                "A03:2021 Injection",
                "DOM-based XSS using document.write with location",
                None,
            ),
            (
                r"(?is)<script>.*?document\.write\s*\(.*?localStorage.*?\)",
                "XSS",
                "DOM-based XSS",
                "CWE-79",
                "A03:2021 Injection",
                "DOM-based XSS using document.write with localStorage",
                None,
            ),
            (
                r"(?is)<script>.*?innerHTML\s*=.*?location",
                "XSS",
                "DOM-based XSS",
                "CWE-79",
                "A03:2021 Injection",
                "DOM-based XSS setting innerHTML from location",
                None,
            ),
            (
                r#"(?i)<input[^>]*value\s*=\s*["']?\s*<\?php\s+echo\s+\$_(GET|POST|REQUEST)"#,
                "XSS",
                "Reflected XSS",
                "CWE-79",
                "A03:2021 Injection",
                "Reflected XSS via PHP echo of user input",
                None,
            ),
            (
                r#"(?is)<form[^>]*method\s*=\s*["']?\s*POST["']?[^>]*>.*?</form>"#,
                "CSRF",
                "Missing Token",
                "CWE-352",
                "A01:2021 Broken Access Control",
                "POST form without CSRF token",
                Some("csrf"),
            ),
            (
                r"(?is)<!--.*?password.*?-->",
                "Information Disclosure",
                "Sensitive Comment",
                "CWE-200",
                "A05:2021 Security Misconfiguration",
                "Comment containing password information",
                None,
            ),
            (
                r"(?is)<!--.*?TODO.*?-->",
                "Information Disclosure",
                "Developer Comment",
                "CWE-200",
                "A05:2021 Security Misconfiguration",
                "Developer TODO comment in production code",
                None,
            ),
            (
                r#"(?i)<input[^>]*type\s*=\s*["']?password["']?[^>]*autocomplete\s*=\s*["']?on["']?"#,
                "Information Disclosure",
                "Password Storage",
                "CWE-200",
                "A05:2021 Security Misconfiguration",
                "Password field with autocomplete enabled",
                None,
            ),
        ];

        table
            .into_iter()
            .map(
                |(pattern, category, subtype, cwe, owasp, description, unless_contains)| {
                    VulnPattern {
                        regex: Regex::new(pattern).expect("static regex"),
                        category,
                        subtype,
                        cwe,
                        owasp,
                        description,
                        unless_contains,
                    }
                },
            )
            .collect()
    })
}

/// Scans page HTML against the pattern database
pub fn scan(url: &str, html: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for pattern in pattern_db() {
        for matched in pattern.regex.find_iter(html) {
            let snippet = matched.as_str();
            if let Some(veto) = pattern.unless_contains {
                if snippet.to_lowercase().contains(veto) {
                    continue;
                }
            }

            let line = line_of_offset(html, matched.start());
            let evidence = context_lines(html, line, 3);

            findings.push(
                Finding::new(
                    pattern.subtype,
                    pattern.description,
                    pattern.category,
                    risk_for_category(pattern.category),
                    url,
                    FindingSource::Pattern,
                )
                .with_cwe(pattern.cwe)
                .with_owasp(pattern.owasp)
                .with_line(line)
                .with_evidence(evidence),
            );
        }
    }

    findings
}

/// 1-based line number of a byte offset
fn line_of_offset(html: &str, offset: usize) -> u32 {
    html[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}

/// A few lines of context around the matched line
fn context_lines(html: &str, line: u32, radius: u32) -> String {
    let lines: Vec<&str> = html.lines().collect();
    let start = line.saturating_sub(radius + 1) as usize;
    let end = ((line + radius) as usize).min(lines.len());
    lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    const URL: &str = "https://example.com/page";

    #[test]
    fn detects_dom_xss() {
        let html = "<html>\n<body>\n<script>document.write(location.hash)</script>\n</body>";
        let findings = scan(URL, html);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, "XSS");
        assert_eq!(findings[0].cwe_id.as_deref(), Some("CWE-79"));
        assert_eq!(findings[0].line, Some(3));
        assert_eq!(findings[0].risk, RiskLevel::High);
    }

    #[test]
    fn detects_post_form_without_csrf_token() {
        let html = r#"<form action="/pay" method="POST"><input name="amount"></form>"#;
        let findings = scan(URL, html);
        assert!(findings.iter().any(|f| f.category == "CSRF"));
    }

    #[test]
    fn form_with_csrf_token_is_clean() {
        let html = r#"<form method="POST"><input type="hidden" name="csrf_token"></form>"#;
        let findings = scan(URL, html);
        assert!(!findings.iter().any(|f| f.category == "CSRF"));
    }

    #[test]
    fn detects_sensitive_comment() {
        let html = "<!-- default password is admin123 -->";
        let findings = scan(URL, html);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Sensitive Comment");
        assert_eq!(findings[0].risk, RiskLevel::Low);
    }

    #[test]
    fn clean_page_has_no_findings() {
        let html = "<html><body><p>Welcome</p><a href=\"/about\">About</a></body></html>";
        assert!(scan(URL, html).is_empty());
    }
}
