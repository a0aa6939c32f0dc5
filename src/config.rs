//! Configuration management for the Vigil agent
//!
//! Settings live in a YAML document (default `config/settings.yaml`), are
//! loaded once at startup and read-only afterwards. A missing file falls
//! back to defaults; CLI flags override file values.

use crate::error::{Result, VigilError};
use crate::models::RiskLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Navigator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Run the browser headless (browser feature only)
    pub headless: bool,
    /// Page load timeout in milliseconds
    pub timeout: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Wait time in ms after page load for JS rendering (browser feature only)
    pub render_wait_ms: u64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout: 30_000,
            user_agent: "Vigil-Agent/0.1.0".to_string(),
            render_wait_ms: 3_000,
        }
    }
}

/// Reasoning engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether LLM analysis is enabled
    pub enabled: bool,
    /// Path to the local model file (managed by `vigil model`)
    pub model_path: String,
    /// Inference endpoint (Ollama-compatible API)
    pub endpoint: String,
    /// Model name served by the endpoint
    pub model: String,
    /// Model context window in tokens
    pub context_window: usize,
    /// Sampling temperature (0.0 is deterministic for a fixed model)
    pub temperature: f64,
    /// Maximum tokens to generate per call
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: String::new(),
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            context_window: 4096,
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

/// External scanner and enrichment settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Path to a ZAP installation, used to spawn a daemon when the
    /// endpoint is not already reachable
    pub zap_path: Option<String>,
    /// ZAP daemon API endpoint
    pub zap_endpoint: String,
    /// ZAP API key, if the daemon requires one
    pub zap_api_key: Option<String>,
    /// Scan timeout in seconds
    pub scan_timeout: u64,
    /// Minimum risk level for a finding to appear in the report
    pub risk_threshold: RiskLevel,
    /// Enrich findings with CVE data from NVD
    pub nvd_enrich: bool,
    /// NVD API key for higher rate limits
    pub nvd_api_key: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            zap_path: None,
            zap_endpoint: "http://localhost:8080".to_string(),
            zap_api_key: None,
            scan_timeout: 300,
            risk_threshold: RiskLevel::Medium,
            nvd_enrich: false,
            nvd_api_key: None,
        }
    }
}

/// Orchestration limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentLimits {
    /// Maximum link depth from the start page
    pub max_depth: u32,
    /// Maximum number of pages to visit
    pub max_pages: usize,
    /// Consecutive navigation failures before the crawl aborts
    pub max_consecutive_failures: u32,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 25,
            max_consecutive_failures: 3,
        }
    }
}

/// Full agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub navigator: NavigatorConfig,
    pub llm: LlmConfig,
    pub security: SecurityConfig,
    pub agent: AgentLimits,
}

impl AgentConfig {
    /// Loads configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VigilError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: AgentConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Loads configuration from a file, falling back to defaults when the
    /// file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serializes the configuration back to YAML and writes it to `path`,
    /// creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

/// CLI overrides merged on top of a loaded configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub headless: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub max_depth: Option<u32>,
    pub max_pages: Option<usize>,
    pub risk_threshold: Option<RiskLevel>,
    pub no_llm: bool,
    pub scan_timeout: Option<u64>,
}

/// Applies CLI overrides to an existing configuration
pub fn merge_cli_overrides(config: &mut AgentConfig, overrides: CliOverrides) {
    if let Some(headless) = overrides.headless {
        config.navigator.headless = headless;
    }
    if let Some(timeout) = overrides.timeout_ms {
        config.navigator.timeout = timeout;
    }
    if let Some(depth) = overrides.max_depth {
        config.agent.max_depth = depth;
    }
    if let Some(pages) = overrides.max_pages {
        config.agent.max_pages = pages;
    }
    if let Some(threshold) = overrides.risk_threshold {
        config.security.risk_threshold = threshold;
    }
    if overrides.no_llm {
        config.llm.enabled = false;
    }
    if let Some(timeout) = overrides.scan_timeout {
        config.security.scan_timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();
        assert!(config.navigator.headless);
        assert_eq!(config.navigator.timeout, 30_000);
        assert_eq!(config.llm.context_window, 4096);
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.security.scan_timeout, 300);
        assert_eq!(config.security.risk_threshold, RiskLevel::Medium);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "navigator:\n  timeout: 5000\n";
        let config: AgentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.navigator.timeout, 5000);
        assert!(config.navigator.headless);
        assert_eq!(config.llm.model, "llama3");
    }

    #[test]
    fn overrides_take_precedence() {
        let mut config = AgentConfig::default();
        merge_cli_overrides(
            &mut config,
            CliOverrides {
                headless: Some(false),
                risk_threshold: Some(RiskLevel::Low),
                no_llm: true,
                ..CliOverrides::default()
            },
        );
        assert!(!config.navigator.headless);
        assert_eq!(config.security.risk_threshold, RiskLevel::Low);
        assert!(!config.llm.enabled);
    }
}
