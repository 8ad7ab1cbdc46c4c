//! # Configuration Module
//!
//! Settings for an [`crate::Api`]: the `info` block of the generated OpenAPI
//! document and the logging setup.
//!
//! ## Environment Variables
//!
//! [`ApiConfig::from_env`] starts from the defaults and overrides them with:
//!
//! | Variable               | Field         | Default   |
//! |------------------------|---------------|-----------|
//! | `SPECCIFY_TITLE`       | `title`       | `API`     |
//! | `SPECCIFY_VERSION`     | `version`     | `0.1.0`   |
//! | `SPECCIFY_DESCRIPTION` | `description` | none      |
//! | `SPECCIFY_LOG_LEVEL`   | `log_level`   | `info`    |
//! | `SPECCIFY_LOG_FORMAT`  | `log_format`  | `json`    |
//! | `SPECCIFY_LOG_FILTER`  | `log_filter`  | none      |
//!
//! `RUST_LOG`, when set, wins over `SPECCIFY_LOG_LEVEL`.
//!
//! ```rust
//! use speccify::ApiConfig;
//!
//! let config = ApiConfig::new("Pet Store", "1.2.0");
//! assert_eq!(config.title, "Pet Store");
//! ```

use crate::logging::LogFormat;
use std::env;

/// Configuration of an [`crate::Api`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `info.title` of the generated document
    pub title: String,
    /// `info.version` of the generated document
    pub version: String,
    pub description: Option<String>,
    /// Level used when `RUST_LOG` is not set
    pub log_level: String,
    pub log_format: LogFormat,
    /// Extra comma-separated filter directives, e.g. `speccify::router=debug`
    pub log_filter: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            title: "API".to_string(),
            version: "0.1.0".to_string(),
            description: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            log_filter: None,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        ApiConfig {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        ApiConfig {
            title: lookup("SPECCIFY_TITLE").unwrap_or(defaults.title),
            version: lookup("SPECCIFY_VERSION").unwrap_or(defaults.version),
            description: lookup("SPECCIFY_DESCRIPTION").or(defaults.description),
            log_level: lookup("SPECCIFY_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("SPECCIFY_LOG_FORMAT")
                .map_or(defaults.log_format, |s| LogFormat::parse(&s)),
            log_filter: lookup("SPECCIFY_LOG_FILTER")
                .filter(|s| !s.trim().is_empty())
                .or(defaults.log_filter),
        }
    }
}
