//! Top-level configuration of a Commons deployment.

use super::traits::Validatable;
use super::validation::{EnvOverride, ValidationContext, Validator};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Main configuration.
///
/// # Example YAML
///
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 8080
///
/// tenancy:
///   base_domain: platform.com
///   trust_forwarded_host: true
///
/// logging:
///   level: info
///   format: json
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommonsConfig {
    /// HTTP listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Host-to-tenant resolution and data scoping.
    #[serde(default)]
    pub tenancy: TenancyConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Validatable for CommonsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut ctx = ValidationContext::new();

        ctx.enter("server");
        self.server.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.enter("tenancy");
        self.tenancy.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.enter("logging");
        self.logging.validate_with_context(&mut ctx);
        ctx.exit();

        ctx.into_result()
    }
}

impl CommonsConfig {
    /// Applies `COMMONS_*` environment variable overrides.
    ///
    /// - `COMMONS_SERVER_PORT=9090` overrides `server.port`
    /// - `COMMONS_TENANCY_BASE_DOMAIN=example.org` overrides `tenancy.base_domain`
    /// - `COMMONS_TENANCY_RESERVED_SUBDOMAINS=www,api` replaces the reserved list
    pub fn apply_env_overrides(&mut self) {
        self.server.apply_env_overrides("COMMONS_SERVER");
        self.tenancy.apply_env_overrides("COMMONS_TENANCY");
        self.logging.apply_env_overrides("COMMONS_LOGGING");
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        Validator::new(ctx)
            .require_non_empty("host", &self.host)
            .in_range("port", &self.port, &1, &65535);
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_HOST"), &mut self.host);
        EnvOverride::apply_number(&format!("{prefix}_PORT"), &mut self.port);
    }
}

/// Tenant resolution and data scoping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Platform apex domain; tenants live at `<subdomain>.<base_domain>`.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    /// Subdomains that can never belong to a tenant.
    #[serde(default = "default_reserved_subdomains")]
    pub reserved_subdomains: Vec<String>,

    /// Hosts treated as the platform itself during local development.
    #[serde(default = "default_development_hosts")]
    pub development_hosts: Vec<String>,

    /// Prefix of generated custom-domain verification tokens.
    #[serde(default = "default_verification_token_prefix")]
    pub verification_token_prefix: String,

    /// Read the tenant host from `X-Forwarded-Host` (only behind a trusted proxy).
    #[serde(default)]
    pub trust_forwarded_host: bool,

    /// Reject query results carrying a foreign organization id.
    #[serde(default = "default_validate_results")]
    pub validate_results: bool,
}

fn default_base_domain() -> String {
    "platform.com".to_string()
}

/// The built-in reserved subdomain list.
pub const DEFAULT_RESERVED_SUBDOMAINS: &[&str] = &[
    "www",
    "api",
    "admin",
    "app",
    "mail",
    "smtp",
    "ftp",
    "localhost",
    "staging",
    "dev",
    "test",
    "demo",
    "support",
    "help",
    "blog",
    "docs",
    "status",
    "superadmin",
    "super-admin",
];

fn default_reserved_subdomains() -> Vec<String> {
    DEFAULT_RESERVED_SUBDOMAINS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_development_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

fn default_verification_token_prefix() -> String {
    "commons-verify-".to_string()
}

const fn default_validate_results() -> bool {
    true
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            reserved_subdomains: default_reserved_subdomains(),
            development_hosts: default_development_hosts(),
            verification_token_prefix: default_verification_token_prefix(),
            trust_forwarded_host: false,
            validate_results: default_validate_results(),
        }
    }
}

impl TenancyConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        let mut validator = Validator::new(ctx);
        validator
            .hostname("base_domain", &self.base_domain)
            .custom(
                "base_domain",
                || self.base_domain.contains('.'),
                "Base domain must contain at least two labels",
            )
            .require_non_empty("verification_token_prefix", &self.verification_token_prefix)
            .custom(
                "reserved_subdomains",
                || {
                    self.reserved_subdomains
                        .iter()
                        .all(|s| !s.is_empty() && *s == s.to_lowercase())
                },
                "Reserved subdomains must be non-empty lowercase labels",
            );

        for host in &self.development_hosts {
            validator.hostname("development_hosts", host);
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_BASE_DOMAIN"), &mut self.base_domain);
        EnvOverride::apply_list(
            &format!("{prefix}_RESERVED_SUBDOMAINS"),
            &mut self.reserved_subdomains,
        );
        EnvOverride::apply_list(
            &format!("{prefix}_DEVELOPMENT_HOSTS"),
            &mut self.development_hosts,
        );
        EnvOverride::apply_string(
            &format!("{prefix}_VERIFICATION_TOKEN_PREFIX"),
            &mut self.verification_token_prefix,
        );
        EnvOverride::apply_bool(
            &format!("{prefix}_TRUST_FORWARDED_HOST"),
            &mut self.trust_forwarded_host,
        );
        EnvOverride::apply_bool(
            &format!("{prefix}_VALIDATE_RESULTS"),
            &mut self.validate_results,
        );
    }

    /// Returns true if `label` is on the reserved list.
    #[must_use]
    pub fn is_reserved(&self, label: &str) -> bool {
        self.reserved_subdomains.iter().any(|r| r == label)
    }
}

/// Logging configuration carried in the main config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling log files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file_dir: None,
        }
    }
}

impl LoggingConfig {
    fn validate_with_context(&self, ctx: &mut ValidationContext) {
        let level = self.level.to_lowercase();
        let format = self.format.to_lowercase();
        Validator::new(ctx)
            .custom(
                "level",
                || matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error"),
                "Level must be one of trace, debug, info, warn, error",
            )
            .custom(
                "format",
                || matches!(format.as_str(), "json" | "pretty"),
                "Format must be 'json' or 'pretty'",
            );
    }

    fn apply_env_overrides(&mut self, prefix: &str) {
        EnvOverride::apply_string(&format!("{prefix}_LEVEL"), &mut self.level);
        EnvOverride::apply_string(&format!("{prefix}_FORMAT"), &mut self.format);
        EnvOverride::apply_optional_string(&format!("{prefix}_FILE_DIR"), &mut self.file_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_defaults_are_valid() {
        let config = CommonsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tenancy.base_domain, "platform.com");
        assert!(config.tenancy.validate_results);
        assert!(!config.tenancy.trust_forwarded_host);
    }

    #[test]
    fn test_default_reserved_list() {
        let tenancy = TenancyConfig::default();
        for word in ["www", "api", "admin", "superadmin", "super-admin", "status"] {
            assert!(tenancy.is_reserved(word), "{word} should be reserved");
        }
        assert!(!tenancy.is_reserved("acme"));
        assert_eq!(tenancy.reserved_subdomains.len(), 19);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r"
tenancy:
  base_domain: commons.test
  trust_forwarded_host: true
";
        let config: CommonsConfig = ConfigLoader::new()
            .load_str(yaml, ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.tenancy.base_domain, "commons.test");
        assert!(config.tenancy.trust_forwarded_host);
        assert_eq!(config.server.port, 8080);
        assert!(config.tenancy.is_reserved("www"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_domain() {
        let mut config = CommonsConfig::default();
        config.tenancy.base_domain = "Platform.com:443".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tenancy.base_domain"));
    }

    #[test]
    fn test_single_label_base_domain_rejected() {
        let mut config = CommonsConfig::default();
        config.tenancy.base_domain = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_port_and_logging() {
        let mut config = CommonsConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = CommonsConfig::default();
        config.logging.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_toml_roundtrip_keeps_reserved() {
        let toml = r#"
[tenancy]
base_domain = "platform.com"
reserved_subdomains = ["www", "portal"]
"#;
        let config: CommonsConfig = ConfigLoader::new()
            .load_str(toml, ConfigFormat::Toml)
            .unwrap();
        assert!(config.tenancy.is_reserved("portal"));
        assert!(!config.tenancy.is_reserved("api"));
    }
}
