//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check URLs and module identifiers parse
//! - Validate value ranges (timeouts > 0, ranges ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MinterConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::blockchain::payload::ModuleId;
use crate::config::schema::{FromTo, MinterConfig};

/// Shortest name the registrar accepts.
const MIN_NAME_LENGTH: u64 = 3;

/// Longest name the registrar accepts.
const MAX_NAME_LENGTH: u64 = 63;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MinterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_range(&mut errors, "settings.sleep_time", config.settings.sleep_time);
    if config.settings.max_wallet_attempts == 0 {
        errors.push(ValidationError::new("settings.max_wallet_attempts", "must be > 0"));
    }

    check_url(&mut errors, "node.url", &config.node.url);
    check_url(&mut errors, "names.api_url", &config.names.api_url);
    check_url(&mut errors, "node.explorer_url", &config.node.explorer_url);

    if config.node.request_timeout_secs == 0 {
        errors.push(ValidationError::new("node.request_timeout_secs", "must be > 0"));
    }
    if config.node.max_poll_attempts == 0 {
        errors.push(ValidationError::new("node.max_poll_attempts", "must be > 0"));
    }
    if config.node.max_gas_amount == 0 {
        errors.push(ValidationError::new("node.max_gas_amount", "must be > 0"));
    }

    if config.names.router_module.parse::<ModuleId>().is_err() {
        errors.push(ValidationError::new(
            "names.router_module",
            format!("'{}' is not an address::module pair", config.names.router_module),
        ));
    }
    let length = config.names.name_length;
    check_range(&mut errors, "names.name_length", length);
    if length.from < MIN_NAME_LENGTH || length.to > MAX_NAME_LENGTH {
        errors.push(ValidationError::new(
            "names.name_length",
            format!("must lie within {}..={}", MIN_NAME_LENGTH, MAX_NAME_LENGTH),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: &'static str, range: FromTo) {
    if range.from > range.to {
        errors.push(ValidationError::new(
            field,
            format!("from ({}) is greater than to ({})", range.from, range.to),
        ));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}
