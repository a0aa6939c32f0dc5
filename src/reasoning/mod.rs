//! Reasoning engine façade over a local LLM runtime
//!
//! The orchestrator talks to [`ReasoningEngine`], which builds prompts from
//! page context, keeps them within the model's context window and parses
//! structured responses into findings. Backends implement [`LlmEngine`].

pub mod mock;
pub mod ollama;
pub mod parser;
pub mod prompt;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::models::{Finding, PageContext};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A text-generation backend
#[async_trait]
pub trait LlmEngine: Send + Sync {
    /// Generates a completion for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// High-level security reasoning over page content
pub struct ReasoningEngine {
    engine: Arc<dyn LlmEngine>,
    context_window: usize,
    max_tokens: usize,
}

impl ReasoningEngine {
    /// Wraps a backend with the configured window limits
    pub fn new(engine: Arc<dyn LlmEngine>, config: &LlmConfig) -> Self {
        Self {
            engine,
            context_window: config.context_window,
            max_tokens: config.max_tokens,
        }
    }

    /// Analyzes a page for security issues.
    ///
    /// Oversized pages are analyzed fragment by fragment; a fragment whose
    /// generation fails is skipped with a warning rather than failing the
    /// whole page.
    pub async fn analyze_page(&self, context: &PageContext) -> Result<Vec<Finding>> {
        let budget = prompt::html_budget(self.context_window, self.max_tokens);
        let fragments = prompt::page_fragments(context, budget);
        let chunked = fragments.len() > 1;
        if chunked {
            debug!(
                "Page {} exceeds context window, analyzing {} fragments",
                context.url,
                fragments.len()
            );
        }

        let mut findings = Vec::new();
        for (index, fragment) in fragments.iter().enumerate() {
            let request = prompt::build_analysis_prompt(&context.url, fragment);
            match self.engine.generate(&request).await {
                Ok(response) => {
                    let parsed = parser::parse_response(&response);
                    findings.extend(parser::to_findings(parsed, &context.url));
                }
                Err(e) if chunked => {
                    warn!(
                        "LLM analysis of fragment {}/{} failed for {}: {e}",
                        index + 1,
                        fragments.len(),
                        context.url
                    );
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            "LLM analysis of {} produced {} findings ({})",
            context.url,
            findings.len(),
            self.engine.name()
        );
        Ok(findings)
    }

    /// Backend name for logging
    pub fn backend_name(&self) -> &str {
        self.engine.name()
    }
}
