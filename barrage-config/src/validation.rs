//! Validation of parsed settings

use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;

/// Settings that can check their own values
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Name used to prefix validation errors, e.g. `http.pool`
    fn domain_name(&self) -> &'static str;

    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::domain(self.domain_name(), message)
    }
}

pub fn validate_required_string(value: &str, field: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::domain(domain, format!("{} must not be empty", field)));
    }
    Ok(())
}

/// `value` must be strictly greater than zero
pub fn validate_positive<T>(value: T, field: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value > T::default() {
        Ok(())
    } else {
        Err(ConfigError::domain(
            domain,
            format!("{} must be greater than 0, got {}", field, value),
        ))
    }
}

/// `value` must lie in `min..=max`
pub fn validate_range<T>(value: T, min: T, max: T, field: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Display,
{
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::domain(
            domain,
            format!("{} must be between {} and {}, got {}", field, min, max, value),
        ))
    }
}

/// An absolute `http` or `https` URL
pub fn validate_url(value: &str, field: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(value, field, domain)?;

    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::domain(domain, format!("{} is not a valid URL: {}", field, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::domain(
            domain,
            format!("{} must use http or https, not '{}'", field, url.scheme()),
        ));
    }
    Ok(())
}
