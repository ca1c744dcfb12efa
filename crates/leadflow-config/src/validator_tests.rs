use super::*;

fn configured() -> Config {
    let mut config = Config::default();
    config.lead_store.endpoint = "https://script.google.com/macros/s/abc/exec".to_string();
    config
}

#[test]
fn test_validate_configured_defaults() {
    let result = ConfigValidator::validate(&configured());
    assert!(result.is_valid());
}

#[test]
fn test_missing_endpoint_is_warning() {
    let result = ConfigValidator::validate(&Config::default());
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "lead_store.endpoint"));
}

#[test]
fn test_invalid_endpoint() {
    let mut config = configured();
    config.lead_store.endpoint = "ftp://example.com".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "lead_store.endpoint"));
}

#[test]
fn test_validate_invalid_port() {
    let mut config = configured();
    config.server.port = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "server.port"));
}

#[test]
fn test_zero_fill_timeout() {
    let mut config = configured();
    config.automation.fill_timeout_seconds = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "automation.fill_timeout_seconds"));
}

#[test]
fn test_heartbeat_must_beat_staleness() {
    let mut config = configured();
    config.automation.heartbeat_interval_seconds = 3600;

    let result = ConfigValidator::validate(&config);
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "automation.heartbeat_interval_seconds"));
}

#[test]
fn test_zero_log_capacity() {
    let mut config = configured();
    config.automation.log_capacity = 0;

    assert!(!ConfigValidator::validate(&config).is_valid());
}

#[test]
fn test_bad_entry_path() {
    let mut config = configured();
    config.crm.entry_path = "enquiriesSummary".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "crm.entry_path"));
}

#[test]
fn test_missing_driver_script_warns() {
    let mut config = configured();
    config.browser.driver_script = Some("/nonexistent/driver.js".into());

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.message.contains("does not exist")));
}
