//! Configuration management module.
//!
//! This module provides a configuration system supporting:
//! - YAML, TOML and JSON configuration files
//! - Validation with descriptive, path-qualified error messages
//! - Environment variable overrides for deployment-specific values
//!
//! # Example
//!
//! ```rust,ignore
//! use commons_core::config::{CommonsConfig, ConfigLoader};
//!
//! let mut config: CommonsConfig = ConfigLoader::new().load_file("config.yaml")?;
//! config.apply_env_overrides();
//! ```

mod commons_config;
mod loader;
mod traits;
pub mod validation;

pub use commons_config::{
    CommonsConfig, DEFAULT_RESERVED_SUBDOMAINS, LoggingConfig, ServerConfig, TenancyConfig,
};
pub use loader::{ConfigFormat, ConfigLoader};
pub use traits::Validatable;
pub use validation::{EnvOverride, ValidationContext, ValidationResult, Validator};
