//! Configuration access port trait.

use std::fmt::Display;
use std::str::FromStr;

use crate::domain::error::TraderError;

/// Typed lookups over sectioned key/value configuration.
///
/// Implementors only supply [`get_string`](Self::get_string). The typed
/// getters return `default` when the key is absent or blank, and
/// `ConfigInvalid` when a value is present but does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TraderError> {
        parse_value(self.get_string(section, key), section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TraderError> {
        parse_value(self.get_string(section, key), section, key, default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TraderError> {
        match self.get_string(section, key) {
            Some(raw) if !raw.trim().is_empty() => parse_bool(&raw).ok_or_else(|| {
                TraderError::config_invalid(section, key, format!("'{}' is not a boolean", raw.trim()))
            }),
            _ => Ok(default),
        }
    }
}

/// Accepts true/false, yes/no, on/off and 1/0 in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_value<T>(raw: Option<String>, section: &str, key: &str, default: T) -> Result<T, TraderError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            TraderError::config_invalid(section, key, format!("'{}': {}", raw.trim(), e))
        }),
        _ => Ok(default),
    }
}
