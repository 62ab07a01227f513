//! API configuration types.
//!
//! This module provides configuration for the HTTP layer:
//! - JWT session settings
//! - CORS settings
//! - Request timeout and session cookie name

use commons_core::config::{EnvOverride, Validatable, ValidationContext, Validator};
use commons_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the cookie carrying the session token when no bearer header is sent.
pub const DEFAULT_SESSION_COOKIE: &str = "commons_session";

/// Placeholder signing key. Usable in tests; rejected by validation.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Shortest HS256 signing key accepted, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Session cookie name
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            cors: CorsConfig::default(),
            request_timeout_secs: default_request_timeout(),
            session_cookie: default_session_cookie(),
        }
    }
}

impl ApiConfig {
    /// Returns the request timeout duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Applies `COMMONS_API_*` environment variable overrides.
    ///
    /// `COMMONS_API_JWT_SECRET` is the expected way to supply the signing key.
    pub fn apply_env_overrides(&mut self) {
        EnvOverride::apply_string("COMMONS_API_JWT_SECRET", &mut self.jwt.secret);
        EnvOverride::apply_string("COMMONS_API_JWT_ISSUER", &mut self.jwt.issuer);
        EnvOverride::apply_string("COMMONS_API_JWT_AUDIENCE", &mut self.jwt.audience);
        EnvOverride::apply_number(
            "COMMONS_API_JWT_EXPIRATION_SECS",
            &mut self.jwt.expiration_secs,
        );
        EnvOverride::apply_number(
            "COMMONS_API_REQUEST_TIMEOUT_SECS",
            &mut self.request_timeout_secs,
        );
        EnvOverride::apply_string("COMMONS_API_SESSION_COOKIE", &mut self.session_cookie);
        EnvOverride::apply_list(
            "COMMONS_API_CORS_ALLOWED_ORIGINS",
            &mut self.cors.allowed_origins,
        );
    }
}

impl Validatable for ApiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();

        ctx.enter("jwt");
        Validator::new(&mut ctx)
            .require_non_empty("secret", &self.jwt.secret)
            .custom(
                "secret",
                || self.jwt.secret != DEFAULT_JWT_SECRET,
                "The placeholder secret cannot sign sessions; set COMMONS_API_JWT_SECRET",
            )
            .custom(
                "secret",
                || self.jwt.secret.len() >= MIN_JWT_SECRET_LEN,
                "Secret must be at least 32 bytes",
            )
            .require_non_empty("issuer", &self.jwt.issuer)
            .require_non_empty("audience", &self.jwt.audience)
            .positive("expiration_secs", &self.jwt.expiration_secs);
        ctx.exit();

        Validator::new(&mut ctx)
            .positive("request_timeout_secs", &self.request_timeout_secs)
            .require_non_empty("session_cookie", &self.session_cookie);

        ctx.into_result()
    }
}

/// JWT session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret (supply through `COMMONS_API_JWT_SECRET` in production)
    #[serde(default = "default_jwt_secret")]
    pub secret: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_expiration")]
    pub expiration_secs: u64,

    /// Issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Audience claim
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            expiration_secs: default_token_expiration(),
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }
}

impl JwtConfig {
    /// Returns the token lifetime.
    #[must_use]
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins (empty means any origin)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Allow credentials (requires explicit origins)
    #[serde(default)]
    pub allow_credentials: bool,

    /// Max age for preflight cache in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![],
            allow_credentials: false,
            max_age_secs: default_max_age(),
        }
    }
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_expiration() -> u64 {
    60 * 60 * 24 * 30
}

fn default_issuer() -> String {
    "commons".to_string()
}

fn default_audience() -> String {
    "commons-api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_session_cookie() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_age() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn valid() -> ApiConfig {
        let mut config = ApiConfig::default();
        config.jwt.secret = SECRET.to_string();
        config
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.session_cookie, "commons_session");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.jwt.expiration_secs > 0);
        assert!(config.cors.enabled);
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_weak_secrets() {
        let err = ApiConfig::default().validate().unwrap_err().to_string();
        assert!(err.contains("placeholder"), "{err}");

        let mut config = valid();
        config.jwt.secret = "s3cr3t".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("32 bytes"), "{err}");

        config.jwt.secret = "x".repeat(MIN_JWT_SECRET_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ApiConfig = serde_json::from_str(r#"{"jwt": {"secret": "s3cr3t"}}"#).unwrap();
        assert_eq!(config.jwt.secret, "s3cr3t");
        assert_eq!(config.jwt.issuer, "commons");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_validation_rejects_empty_secret() {
        let mut config = ApiConfig::default();
        config.jwt.secret.clear();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("'secret' in section 'jwt'"), "{err}");

        let config = ApiConfig {
            request_timeout_secs: 0,
            ..valid()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("request_timeout_secs"), "{err}");
    }

    #[test]
    fn test_jwt_config_expiration() {
        let config = JwtConfig {
            expiration_secs: 7200,
            ..Default::default()
        };
        assert_eq!(config.expiration(), Duration::from_secs(7200));
    }
}
