//! Common test utilities

use vigil::config::AgentConfig;

/// Creates a test configuration with short timeouts and tight crawl limits
pub fn test_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.navigator.timeout = 5_000;
    config.navigator.user_agent = "Vigil-Test/0.1.0".to_string();
    config.agent.max_depth = 2;
    config.agent.max_pages = 10;
    config.security.scan_timeout = 5;
    config
}
