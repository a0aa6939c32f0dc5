//! Page structure extraction
//!
//! Turns raw HTML into a [`PageContext`]: visible text, links, forms,
//! inline scripts and comments.

use crate::models::{FormField, PageContext, PageForm};
use scraper::{Html, Selector};
use url::Url;

/// Builds a full PageContext from a page's final URL and HTML source
pub fn build_page_context(url: &Url, html: &str) -> PageContext {
    let document = Html::parse_document(html);

    let mut context = PageContext::new(url.as_str());
    context.html = html.to_string();
    context.title = extract_title(&document);
    context.text = extract_text(&document);
    context.links = extract_links(url, &document);
    context.forms = extract_forms(url, &document);
    context.scripts = extract_scripts(&document);
    context.comments = extract_comments(&document);
    context
}

fn extract_title(document: &Html) -> String {
    let selector = Selector::parse("title").expect("static selector");
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Collects visible text, skipping script and style contents
fn extract_text(document: &Html) -> String {
    let mut parts = Vec::new();

    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                .unwrap_or(false)
        });
        if in_hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join(" ")
}

/// Extracts absolute link URLs (a[href], form[action], link[href], iframe[src])
fn extract_links(base_url: &Url, document: &Html) -> Vec<String> {
    let selectors = [
        ("a[href]", "href"),
        ("form[action]", "action"),
        ("link[href]", "href"),
        ("iframe[src]", "src"),
    ];

    let mut urls = Vec::new();
    for (sel_str, attr) in &selectors {
        let Ok(selector) = Selector::parse(sel_str) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                if let Some(resolved) = resolve_url(base_url, value) {
                    if !urls.contains(&resolved) {
                        urls.push(resolved);
                    }
                }
            }
        }
    }
    urls
}

fn extract_forms(base_url: &Url, document: &Html) -> Vec<PageForm> {
    let form_selector = Selector::parse("form").expect("static selector");
    let field_selector = Selector::parse("input, select, textarea").expect("static selector");

    let mut forms = Vec::new();
    for form in document.select(&form_selector) {
        let action = form
            .value()
            .attr("action")
            .and_then(|a| resolve_url(base_url, a))
            .unwrap_or_else(|| base_url.to_string());
        let method = form
            .value()
            .attr("method")
            .unwrap_or("GET")
            .to_uppercase();

        let mut fields = Vec::new();
        for field in form.select(&field_selector) {
            let Some(name) = field.value().attr("name") else {
                continue;
            };
            let field_type = match field.value().name() {
                "select" => "select".to_string(),
                "textarea" => "textarea".to_string(),
                _ => field.value().attr("type").unwrap_or("text").to_string(),
            };
            fields.push(FormField {
                name: name.to_string(),
                field_type,
            });
        }

        forms.push(PageForm {
            action,
            method,
            fields,
            html: form.html(),
        });
    }
    forms
}

/// Extracts inline script bodies (script elements without a src attribute)
fn extract_scripts(document: &Html) -> Vec<String> {
    let selector = Selector::parse("script:not([src])").expect("static selector");
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .filter(|s| !s.trim().is_empty())
        .collect()
}

fn extract_comments(document: &Html) -> Vec<String> {
    document
        .tree
        .nodes()
        .filter_map(|node| node.value().as_comment())
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Resolves a candidate href against the page URL, keeping only http(s)
fn resolve_url(base_url: &Url, candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("javascript:")
        || trimmed.starts_with("mailto:")
        || trimmed.starts_with("tel:")
        || trimmed.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base_url.join(trimmed).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> PageContext {
        let url = Url::parse("https://example.com/app/").unwrap();
        build_page_context(&url, html)
    }

    #[test]
    fn extracts_links_and_resolves_relative() {
        let ctx = page(r#"<a href="/login">Login</a><a href="about.html">About</a>"#);
        assert!(ctx.links.contains(&"https://example.com/login".to_string()));
        assert!(ctx
            .links
            .contains(&"https://example.com/app/about.html".to_string()));
    }

    #[test]
    fn skips_non_navigable_links() {
        let ctx = page(r##"<a href="#top">Top</a><a href="javascript:void(0)">x</a><a href="mailto:a@b.c">mail</a>"##);
        assert!(ctx.links.is_empty());
    }

    #[test]
    fn extracts_form_with_fields() {
        let ctx = page(
            r#"<form action="/search" method="post">
                <input type="text" name="q">
                <select name="lang"><option>en</option></select>
            </form>"#,
        );
        assert_eq!(ctx.forms.len(), 1);
        let form = &ctx.forms[0];
        assert_eq!(form.action, "https://example.com/search");
        assert_eq!(form.method, "POST");
        assert_eq!(form.fields.len(), 2);
        assert_eq!(form.fields[0].name, "q");
        assert_eq!(form.fields[1].field_type, "select");
    }

    #[test]
    fn text_skips_scripts_and_styles() {
        let ctx = page("<p>hello</p><script>var secret = 1;</script><style>p{}</style>");
        assert_eq!(ctx.text, "hello");
        assert_eq!(ctx.scripts, vec!["var secret = 1;".to_string()]);
    }

    #[test]
    fn extracts_comments() {
        let ctx = page("<!-- TODO: remove debug endpoint --><p>x</p>");
        assert_eq!(ctx.comments, vec!["TODO: remove debug endpoint".to_string()]);
    }
}
