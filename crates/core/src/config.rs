//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services
//! by `Arc`. Request handling never reads process-wide environment variables;
//! binaries read the environment and hand values in through
//! [`service_name_from_env_value`].

use crs_types::NonEmptyText;

/// Default service name used when no override is supplied.
pub const DEFAULT_SERVICE_NAME: &str = "crs";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    service_name: NonEmptyText,
}

impl CoreConfig {
    pub fn new(service_name: NonEmptyText) -> Self {
        Self { service_name }
    }

    /// The service name stamped onto audit events and health responses.
    pub fn service_name(&self) -> &str {
        self.service_name.as_str()
    }
}

/// Parse the service name from an optional environment value.
///
/// `None`, empty, and whitespace-only values fall back to
/// [`DEFAULT_SERVICE_NAME`].
pub fn service_name_from_env_value(value: Option<String>) -> NonEmptyText {
    value
        .and_then(|v| NonEmptyText::new(v).ok())
        .unwrap_or_else(|| {
            NonEmptyText::new(DEFAULT_SERVICE_NAME).expect("default service name is non-empty")
        })
}
