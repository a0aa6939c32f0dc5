//! Deterministic mock backend
//!
//! Returns canned responses keyed on patterns in the submitted HTML. Used
//! by the test suite and by offline runs; identical input always yields an
//! identical response regardless of temperature settings.

use crate::error::Result;
use crate::reasoning::{parser, LlmEngine};
use async_trait::async_trait;
use regex::Regex;

struct CannedResponse {
    trigger: Regex,
    /// Substring whose presence suppresses the match (no lookaheads in the
    /// regex crate)
    unless_contains: Option<&'static str>,
    response: &'static str,
}

/// Mock LLM engine with pattern-triggered canned responses
pub struct MockEngine {
    responses: Vec<CannedResponse>,
}

impl MockEngine {
    pub fn new() -> Self {
        let canned = [
            (
                r"document\.write\s*\(.*location",
                None,
                "\nVULNERABILITY 1:\n\
                 Type: XSS\n\
                 Subtype: DOM-based XSS\n\
                 CWE: 79\n\
                 Code: document.write(location.hash)\n\
                 Line: 3\n\
                 Description: User-controlled data from the URL is written to the document without sanitization.\n\
                 Fix: Sanitize the value before writing, e.g. with a sanitizer library.\n",
            ),
            (
                r#"<input[^>]*value\s*=\s*["']?\s*<\?php\s+echo\s+\$_GET"#,
                None,
                "\nVULNERABILITY 1:\n\
                 Type: XSS\n\
                 Subtype: Reflected XSS\n\
                 CWE: 79\n\
                 Code: <input type=\"text\" name=\"username\" value=\"<?php echo $_GET['user']; ?>\">\n\
                 Line: 2\n\
                 Description: Unsanitized GET input is echoed into an HTML attribute, allowing attribute escape.\n\
                 Fix: Escape output with htmlspecialchars($_GET['user'], ENT_QUOTES).\n",
            ),
            (
                r#"(?i)<form[^>]*method\s*=\s*["']?\s*POST["']?[^>]*>"#,
                Some("csrf"),
                "\nVULNERABILITY 1:\n\
                 Type: CSRF\n\
                 Subtype: Missing Token\n\
                 CWE: 352\n\
                 Code: <form action=\"process.php\" method=\"POST\">\n\
                 Line: 1\n\
                 Description: The form submits a POST request without a CSRF token.\n\
                 Fix: Add a hidden csrf_token field validated server side.\n",
            ),
            (
                r"innerHTML\s*=",
                None,
                "\nVULNERABILITY 1:\n\
                 Type: XSS\n\
                 Subtype: DOM-based XSS\n\
                 CWE: 79\n\
                 Code: element.innerHTML = userControlled\n\
                 Line: 7\n\
                 Description: User-controlled data is inserted into the DOM via innerHTML without sanitization.\n\
                 Fix: Use textContent, or sanitize the value first.\n",
            ),
        ];

        Self {
            responses: canned
                .into_iter()
                .map(|(pattern, unless_contains, response)| CannedResponse {
                    trigger: Regex::new(pattern).expect("static regex"),
                    unless_contains,
                    response,
                })
                .collect(),
        }
    }

    /// Pulls the fenced HTML block out of an analysis prompt
    fn extract_html(prompt: &str) -> Option<&str> {
        let start = prompt.find("```html\n")? + "```html\n".len();
        let end = prompt[start..].find("```")? + start;
        Some(&prompt[start..end])
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmEngine for MockEngine {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(html) = Self::extract_html(prompt) else {
            return Ok(parser::NO_VULNERABILITIES.to_string());
        };

        let lower = html.to_lowercase();
        for canned in &self.responses {
            if !canned.trigger.is_match(html) {
                continue;
            }
            if let Some(veto) = canned.unless_contains {
                if lower.contains(veto) {
                    continue;
                }
            }
            return Ok(canned.response.to_string());
        }

        Ok(parser::NO_VULNERABILITIES.to_string())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::prompt::build_analysis_prompt;

    #[tokio::test]
    async fn dom_xss_triggers_canned_response() {
        let engine = MockEngine::new();
        let request = build_analysis_prompt(
            "https://example.com",
            "<script>document.write(location.hash)</script>",
        );
        let response = engine.generate(&request).await.unwrap();
        assert!(response.contains("DOM-based XSS"));
    }

    #[tokio::test]
    async fn clean_html_yields_sentinel() {
        let engine = MockEngine::new();
        let request = build_analysis_prompt("https://example.com", "<p>hello world</p>");
        let response = engine.generate(&request).await.unwrap();
        assert_eq!(response, parser::NO_VULNERABILITIES);
    }
}
