//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_lead_store(config, &mut result);
        Self::validate_automation(config, &mut result);
        Self::validate_crm(config, &mut result);
        Self::validate_browser(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_lead_store(config: &Config, result: &mut ValidationResult) {
        let endpoint = config.lead_store.endpoint.trim();
        if endpoint.is_empty() {
            result.add_warning(ValidationWarning::new(
                "lead_store.endpoint",
                "Lead store endpoint is not set; runs cannot start until it is configured",
            ));
        } else if !is_http_url(endpoint) {
            result.add_error(ValidationError::new(
                "lead_store.endpoint",
                "endpoint must be an http:// or https:// URL",
            ));
        }

        if config.lead_store.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "lead_store.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_automation(config: &Config, result: &mut ValidationResult) {
        let automation = &config.automation;

        for (path, value) in [
            ("automation.fill_timeout_seconds", automation.fill_timeout_seconds),
            ("automation.init_timeout_seconds", automation.init_timeout_seconds),
            ("automation.heartbeat_interval_seconds", automation.heartbeat_interval_seconds),
            ("automation.sync_interval_minutes", automation.sync_interval_minutes),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "must be greater than 0"));
            }
        }

        if automation.heartbeat_interval_seconds >= automation.staleness_threshold_seconds {
            result.add_error(ValidationError::new(
                "automation.heartbeat_interval_seconds",
                "heartbeat interval must be shorter than the staleness threshold",
            ));
        }

        if automation.log_capacity == 0 {
            result.add_error(ValidationError::new(
                "automation.log_capacity",
                "log_capacity must be greater than 0",
            ));
        }

        if automation.retry_attempts == 0 {
            result.add_warning(ValidationWarning::new(
                "automation.retry_attempts",
                "retry_attempts is 0; the driver will be probed once",
            ));
        }
    }

    fn validate_crm(config: &Config, result: &mut ValidationResult) {
        if !is_http_url(&config.crm.origin) {
            result.add_error(ValidationError::new(
                "crm.origin",
                "origin must be an http:// or https:// URL",
            ));
        }

        if !config.crm.entry_path.starts_with('/') {
            result.add_error(ValidationError::new(
                "crm.entry_path",
                "entry_path must start with '/'",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new("browser.debug_port", "Port cannot be 0"));
        }

        match config.browser.resolved_driver_script() {
            None => result.add_warning(ValidationWarning::new(
                "browser.driver_script",
                "No driver script configured; the CRM page must already host the driver",
            )),
            Some(path) if !path.exists() => result.add_warning(ValidationWarning::new(
                "browser.driver_script",
                format!("Driver script does not exist: {}", path.display()),
            )),
            Some(_) => {}
        }
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
