use tabscope_core::config::{ScopeConfig, DEFAULT_SELECTORS};

#[test]
fn default_selectors_apply_when_none_are_given() {
    let config = ScopeConfig::default();
    let selectors = config.effective_selectors();
    assert_eq!(selectors.len(), DEFAULT_SELECTORS.len());
    assert_eq!(selectors[0], "button");
}

#[test]
fn explicit_selectors_replace_the_default_set() {
    let config = ScopeConfig {
        selectors: vec![".hero".to_string(), "nav a".to_string()],
        ..ScopeConfig::default()
    };
    assert_eq!(config.effective_selectors(), vec![".hero", "nav a"]);
}

#[test]
fn endpoint_joins_host_and_port() {
    let config = ScopeConfig {
        host: "localhost".to_string(),
        port: 9333,
        ..ScopeConfig::default()
    };
    assert_eq!(config.endpoint(), "localhost:9333");
}
