//! Orchestration loop
//!
//! Coordinates navigation, analysis and scanning against one target:
//! a same-host BFS over discovered links with visited-URL tracking, pattern
//! plus LLM analysis per page, one external ZAP scan of the target after the
//! crawl, and report assembly.
//!
//! Stopping criteria: depth limit, page budget, empty frontier, or too many
//! consecutive navigation failures. Isolated page failures are skipped; the
//! navigator session is released on every exit path.

use crate::analysis::{self, nvd::NvdClient, patterns};
use crate::config::AgentConfig;
use crate::error::{Result, VigilError};
use crate::models::{Finding, ScanReport};
use crate::navigator::Navigate;
use crate::reasoning::ReasoningEngine;
use crate::scanner::ZapScanner;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// The agent control loop
pub struct Orchestrator {
    config: AgentConfig,
    navigator: Arc<dyn Navigate>,
    reasoning: Option<ReasoningEngine>,
    scanner: Option<ZapScanner>,
    nvd: Option<NvdClient>,
}

impl Orchestrator {
    pub fn new(
        config: AgentConfig,
        navigator: Arc<dyn Navigate>,
        reasoning: Option<ReasoningEngine>,
        scanner: Option<ZapScanner>,
        nvd: Option<NvdClient>,
    ) -> Self {
        Self {
            config,
            navigator,
            reasoning,
            scanner,
            nvd,
        }
    }

    /// Runs the full agent loop against a target. The navigator session and
    /// any spawned scanner daemon are released even when the run fails.
    pub async fn run(&self, target: &str) -> Result<ScanReport> {
        let outcome = self.run_inner(target).await;

        if let Err(e) = self.navigator.close().await {
            warn!("Failed to release navigator session: {e}");
        }
        if let Some(ref scanner) = self.scanner {
            scanner.shutdown().await;
        }

        outcome
    }

    async fn run_inner(&self, target: &str) -> Result<ScanReport> {
        let base = Url::parse(target)?;
        let base_host = base
            .host_str()
            .ok_or_else(|| VigilError::ConfigError(format!("target {target} has no host")))?
            .to_string();

        let mut report = ScanReport::new(target);
        let mut findings: Vec<Finding> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
        let mut consecutive_failures: u32 = 0;
        let mut last_error: Option<VigilError> = None;

        visited.insert(normalize_url(target));
        frontier.push_back((target.to_string(), 0));

        let limits = &self.config.agent;
        let pb = ProgressBar::new(limits.max_pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        while let Some((url, depth)) = frontier.pop_front() {
            if report.pages_visited.len() >= limits.max_pages {
                info!("Page budget of {} reached, stopping crawl", limits.max_pages);
                break;
            }

            pb.set_message(format!("Visiting {url}"));

            let context = match self.navigator.navigate_to(&url).await {
                Ok(ctx) => {
                    consecutive_failures = 0;
                    ctx
                }
                Err(e) => {
                    warn!("Navigation to {url} failed: {e}");
                    consecutive_failures += 1;
                    last_error = Some(e);
                    if consecutive_failures >= limits.max_consecutive_failures {
                        error!(
                            "{consecutive_failures} consecutive navigation failures, aborting crawl"
                        );
                        break;
                    }
                    continue;
                }
            };

            report.pages_visited.push(context.url.clone());
            pb.inc(1);

            let pattern_findings = patterns::scan(&context.url, &context.html);
            debug!(
                "Pattern analysis of {}: {} findings",
                context.url,
                pattern_findings.len()
            );

            let llm_findings = match self.reasoning {
                Some(ref engine) => {
                    report.llm_calls += 1;
                    match engine.analyze_page(&context).await {
                        Ok(found) => found,
                        Err(e) => {
                            warn!("LLM analysis of {} failed: {e}", context.url);
                            Vec::new()
                        }
                    }
                }
                None => Vec::new(),
            };

            findings.extend(analysis::merge_findings(pattern_findings, llm_findings));

            if depth < limits.max_depth {
                for link in &context.links {
                    if !same_host(link, &base_host) {
                        continue;
                    }
                    let normalized = normalize_url(link);
                    if visited.insert(normalized) {
                        frontier.push_back((link.clone(), depth + 1));
                    }
                }
            }
        }

        pb.finish_with_message("Crawl complete");

        if report.pages_visited.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                VigilError::NavigationError {
                    url: target.to_string(),
                    reason: "no pages could be visited".to_string(),
                }
            }));
        }

        info!(
            "Crawl finished: {} pages visited, {} analysis findings",
            report.pages_visited.len(),
            findings.len()
        );

        if let Some(ref scanner) = self.scanner {
            match scanner.scan(target).await {
                Ok(scanner_findings) => {
                    report.scanner_executed = true;
                    findings.extend(scanner_findings);
                }
                Err(e) => {
                    error!("External scan failed: {e}");
                }
            }
        }

        if let Some(ref nvd) = self.nvd {
            nvd.enrich(&mut findings).await;
        }

        report.findings = finalize_findings(findings, &self.config);
        report.finish();
        Ok(report)
    }
}

/// Deduplicates, filters by the risk threshold and sorts by descending risk
fn finalize_findings(mut findings: Vec<Finding>, config: &AgentConfig) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings.retain(|f| {
        let key = format!(
            "{}|{}|{}",
            f.title.to_lowercase(),
            f.url.to_lowercase(),
            f.line.map(|l| l.to_string()).unwrap_or_default()
        );
        seen.insert(key)
    });

    findings.retain(|f| f.risk >= config.security.risk_threshold);
    findings.sort_by(|a, b| b.risk.cmp(&a.risk).then_with(|| a.title.cmp(&b.title)));
    findings
}

/// Normalizes a URL for deduplication (strips fragment and trailing slash)
fn normalize_url(url: &str) -> String {
    if let Ok(mut parsed) = Url::parse(url) {
        parsed.set_fragment(None);
        let mut result = parsed.to_string();
        if result.ends_with('/') && result.len() > 1 {
            result.pop();
        }
        result
    } else {
        url.to_string()
    }
}

fn same_host(url: &str, base_host: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == base_host))
        .unwrap_or(false)
}
