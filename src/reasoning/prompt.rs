//! Prompt construction and context-window budgeting
//!
//! Prompts are sized with a rough 4-characters-per-token heuristic. Pages
//! that fit the window are analyzed whole; oversized pages fall back to
//! high-value fragments (forms and inline scripts first).

use crate::models::PageContext;

/// System message sent with every analysis request
pub const SYSTEM_PROMPT: &str = "You are an expert security analyst specializing in web \
application security. Your task is to identify security vulnerabilities, explain why they \
are issues, and provide clear recommendations to fix them.";

const CHARS_PER_TOKEN: usize = 4;

/// Instruction boilerplate token cost, reserved out of the window
const INSTRUCTION_OVERHEAD_TOKENS: usize = 600;

/// Returns the HTML character budget for one prompt given the model's
/// context window and the tokens reserved for generation
pub fn html_budget(context_window: usize, max_tokens: usize) -> usize {
    context_window
        .saturating_sub(max_tokens)
        .saturating_sub(INSTRUCTION_OVERHEAD_TOKENS)
        .saturating_mul(CHARS_PER_TOKEN)
}

/// Builds the analysis prompt for a fragment of page HTML
pub fn build_analysis_prompt(url: &str, html_fragment: &str) -> String {
    format!(
        "Analyze this HTML from {url} for security vulnerabilities:\n\
         \n\
         ```html\n\
         {html_fragment}\n\
         ```\n\
         \n\
         Consider all web security vulnerability classes, including:\n\
         1. Cross-Site Scripting (XSS) - CWE-79: reflected, stored and DOM-based\n\
         2. Cross-Site Request Forgery (CSRF) - CWE-352: missing anti-CSRF tokens\n\
         3. Injection - CWE-91/CWE-94: HTML, JavaScript or server-side code injection\n\
         4. Information Disclosure - CWE-200: secrets in comments, exposed paths\n\
         5. Client-side-only validation of security controls\n\
         \n\
         Look for subtle, context-specific issues that pattern matching would miss.\n\
         \n\
         Report each issue in exactly this format:\n\
         \n\
         VULNERABILITY 1:\n\
         Type: [main category]\n\
         Subtype: [specific variant, if applicable]\n\
         CWE: [cwe id]\n\
         Code: [smallest vulnerable snippet]\n\
         Line: [approximate line number]\n\
         Description: [brief description]\n\
         Fix: [suggested fix]\n\
         \n\
         VULNERABILITY 2:\n\
         ...\n\
         \n\
         If no vulnerabilities are found, reply with \"NO_VULNERABILITIES_FOUND\"."
    )
}

/// Splits a page into HTML fragments that each fit the character budget.
/// A page within budget comes back as a single fragment; otherwise forms
/// and inline scripts are analyzed individually, falling back to fixed-size
/// chunks when the page has neither.
pub fn page_fragments(context: &PageContext, budget_chars: usize) -> Vec<String> {
    if context.html.len() <= budget_chars {
        return vec![context.html.clone()];
    }

    let mut fragments: Vec<String> = Vec::new();
    for form in &context.forms {
        fragments.push(truncate_chars(&form.html, budget_chars));
    }
    for script in &context.scripts {
        fragments.push(truncate_chars(
            &format!("<script>{script}</script>"),
            budget_chars,
        ));
    }

    if fragments.is_empty() {
        let mut rest = context.html.as_str();
        while !rest.is_empty() {
            let cut = floor_char_boundary(rest, budget_chars.max(1));
            fragments.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
    }

    fragments
}

fn truncate_chars(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        s[..floor_char_boundary(s, limit)].to_string()
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
