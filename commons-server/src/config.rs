//! Server configuration.
//!
//! One file carries the platform sections (`server`, `tenancy`, `logging`),
//! the HTTP settings (`api`), the organizations to provision at startup and
//! the shutdown behaviour.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use commons_api::ApiConfig;
use commons_core::config::{CommonsConfig, EnvOverride, Validatable, ValidationContext, Validator};
use commons_core::error::ConfigError;
use commons_security::tenant::{
    Branding, HostResolver, Organization, OrganizationId, generate_verification_token,
    normalize_host,
};

/// Server configuration.
///
/// # Example YAML
///
/// ```yaml
/// server:
///   port: 8080
/// tenancy:
///   base_domain: platform.com
/// api:
///   jwt:
///     secret: "..."
/// organizations:
///   - name: Acme HOA
///     slug: acme
///     subdomain: acme
///     custom_domain: board.acme.org
///     custom_domain_verified: true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Platform configuration.
    #[serde(flatten)]
    pub commons: CommonsConfig,

    /// HTTP layer configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// Organizations provisioned at startup.
    #[serde(default)]
    pub organizations: Vec<OrganizationSeed>,

    /// Shutdown configuration.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// Applies `COMMONS_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.commons.apply_env_overrides();
        self.api.apply_env_overrides();
        self.shutdown.apply_env_overrides();
    }

    /// Returns the `host:port` the API listens on.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.commons.server.host, self.commons.server.port)
    }
}

impl Validatable for AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.commons.validate()?;
        self.api.validate()?;

        let mut ctx = ValidationContext::new();
        ctx.enter("shutdown");
        Validator::new(&mut ctx).positive("timeout_secs", &self.shutdown.timeout_secs);
        ctx.exit();

        let mut slugs = HashSet::new();
        ctx.enter("organizations");
        for seed in &self.organizations {
            Validator::new(&mut ctx)
                .require_non_empty("name", &seed.name)
                .require_non_empty("slug", &seed.slug)
                .custom(
                    "slug",
                    || slugs.insert(seed.slug.as_str()),
                    "Organization slugs must be unique",
                )
                .custom(
                    "custom_domain_verified",
                    || !seed.custom_domain_verified || seed.custom_domain.is_some(),
                    "Only a configured custom domain can be marked verified",
                );
        }
        ctx.exit();

        ctx.into_result()
    }
}

/// An organization to provision at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSeed {
    /// Fixed ID, so sessions survive restarts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrganizationId>,
    /// Display name
    pub name: String,
    /// Unique slug
    pub slug: String,
    /// Platform subdomain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Custom domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    /// Treat the custom domain as already verified
    #[serde(default)]
    pub custom_domain_verified: bool,
    /// Plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Feature flags
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    /// Branding
    #[serde(default)]
    pub branding: Branding,
}

impl OrganizationSeed {
    /// Builds the organization, checking its hosts with the platform rules.
    pub fn to_organization(
        &self,
        hosts: &HostResolver,
        token_prefix: &str,
    ) -> Result<Organization, String> {
        let mut org = Organization::new(&self.name, &self.slug).with_branding(self.branding.clone());
        if let Some(id) = self.id {
            org = org.with_id(id);
        }
        if let Some(plan) = &self.plan {
            org = org.with_plan(plan);
        }
        for (feature, enabled) in &self.features {
            org = org.with_feature(feature, *enabled);
        }

        if let Some(subdomain) = &self.subdomain {
            let subdomain = subdomain.trim().to_lowercase();
            hosts
                .validate_subdomain(&subdomain)
                .map_err(|e| e.to_string())?;
            org = org.with_subdomain(subdomain);
        }

        if let Some(domain) = &self.custom_domain {
            let domain = normalize_host(domain);
            hosts
                .validate_custom_domain(&domain)
                .map_err(|e| e.to_string())?;
            let token = generate_verification_token(token_prefix).map_err(|e| e.to_string())?;
            org.set_custom_domain(domain, token);
            if self.custom_domain_verified {
                org.mark_domain_verified(Utc::now());
            }
        }

        Ok(org)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// How long in-flight requests may take to drain, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ShutdownConfig {
    /// Applies `COMMONS_SHUTDOWN_TIMEOUT_SECS`.
    pub fn apply_env_overrides(&mut self) {
        EnvOverride::apply_number("COMMONS_SHUTDOWN_TIMEOUT_SECS", &mut self.timeout_secs);
    }

    /// Returns the drain timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
