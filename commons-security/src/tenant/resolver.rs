//! Host-to-tenant resolution.
//!
//! A request host is classified as the platform itself, a platform
//! subdomain, or a candidate custom domain, then looked up in the
//! [`OrganizationDirectory`]. Every failure is terminal and fails closed.

use super::context::{TenantContext, TenantSource};
use super::directory::OrganizationDirectory;
use super::organization::OrganizationId;
use crate::error::{Result, SecurityError};
use commons_core::config::TenancyConfig;
use regex::Regex;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::{Arc, LazyLock};
use tracing::debug;

#[allow(clippy::unwrap_used)]
static CUSTOM_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$")
        .unwrap()
});

const SUBDOMAIN_MIN_LEN: usize = 3;
const SUBDOMAIN_MAX_LEN: usize = 63;
const VERIFICATION_TOKEN_BYTES: usize = 16;

/// Classification of a normalised host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// The platform apex or a development host; carries no tenant.
    Platform,
    /// `<label>.<base_domain>`
    Subdomain(String),
    /// Any other syntactically valid domain.
    CustomDomain(String),
}

/// Lowercases a host and strips its port and trailing dot.
///
/// ```
/// use commons_security::tenant::normalize_host;
///
/// assert_eq!(normalize_host("Acme.Platform.com:8443"), "acme.platform.com");
/// assert_eq!(normalize_host("hoa.example.org."), "hoa.example.org");
/// ```
#[must_use]
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        // [v6]:port
        rest.split(']').next().unwrap_or(rest)
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
            _ => host,
        }
    };
    without_port.trim_end_matches('.').to_lowercase()
}

/// Classifies hosts against the platform domain rules.
#[derive(Debug, Clone)]
pub struct HostResolver {
    base_domain: String,
    reserved: Vec<String>,
    development_hosts: Vec<String>,
}

impl HostResolver {
    /// Builds a resolver from the tenancy configuration.
    #[must_use]
    pub fn new(config: &TenancyConfig) -> Self {
        Self {
            base_domain: normalize_host(&config.base_domain),
            reserved: config
                .reserved_subdomains
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            development_hosts: config
                .development_hosts
                .iter()
                .map(|h| normalize_host(h))
                .collect(),
        }
    }

    /// Returns the platform base domain.
    #[must_use]
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Classifies a raw host header value.
    pub fn classify(&self, host: &str) -> Result<HostTarget> {
        let host = normalize_host(host);
        if host.is_empty() {
            return Err(SecurityError::unresolved_tenant(""));
        }

        if host == self.base_domain || self.development_hosts.contains(&host) {
            return Ok(HostTarget::Platform);
        }

        if let Some(label) = host
            .strip_suffix(self.base_domain.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
        {
            if label.contains('.') {
                return Err(SecurityError::invalid_subdomain(
                    label,
                    "nested subdomains are not tenant hosts",
                ));
            }
            self.validate_subdomain(label)?;
            return Ok(HostTarget::Subdomain(label.to_string()));
        }

        self.validate_custom_domain(&host)?;
        Ok(HostTarget::CustomDomain(host))
    }

    /// Returns true for the platform apex and development hosts.
    #[must_use]
    pub fn is_platform(&self, host: &str) -> bool {
        matches!(self.classify(host), Ok(HostTarget::Platform))
    }

    /// Checks that a label may be used as a tenant subdomain.
    ///
    /// The reserved list is checked first, then the syntax rules:
    /// 3 to 63 characters of `[a-z0-9-]` without a leading or trailing hyphen.
    pub fn validate_subdomain(&self, label: &str) -> Result<()> {
        if self.reserved.iter().any(|r| r == label) {
            return Err(SecurityError::reserved_name(label));
        }

        let len = label.len();
        if !(SUBDOMAIN_MIN_LEN..=SUBDOMAIN_MAX_LEN).contains(&len) {
            return Err(SecurityError::invalid_subdomain(
                label,
                format!("must be {SUBDOMAIN_MIN_LEN} to {SUBDOMAIN_MAX_LEN} characters"),
            ));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SecurityError::invalid_subdomain(
                label,
                "only lowercase letters, digits and hyphens are allowed",
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(SecurityError::invalid_subdomain(
                label,
                "cannot start or end with a hyphen",
            ));
        }
        Ok(())
    }

    /// Checks that a domain may be attached to an organization.
    pub fn validate_custom_domain(&self, domain: &str) -> Result<()> {
        if !CUSTOM_DOMAIN_RE.is_match(domain) {
            return Err(SecurityError::invalid_custom_domain(
                domain,
                "not a valid domain name",
            ));
        }
        if domain == self.base_domain || domain.ends_with(&format!(".{}", self.base_domain)) {
            return Err(SecurityError::invalid_custom_domain(
                domain,
                "cannot be the platform domain or one of its subdomains",
            ));
        }
        let tld = domain.rsplit('.').next().unwrap_or_default();
        if tld.chars().all(|c| c.is_ascii_digit()) {
            return Err(SecurityError::invalid_custom_domain(
                domain,
                "IP addresses are not allowed",
            ));
        }
        Ok(())
    }
}

/// Generates a custom-domain verification token: `prefix` followed by
/// 32 lowercase hex characters from the OS random source.
pub fn generate_verification_token(prefix: &str) -> Result<String> {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| SecurityError::RandomUnavailable)?;
    Ok(format!("{prefix}{}", hex::encode(bytes)))
}

/// Resolves request hosts to tenant contexts.
#[derive(Clone)]
pub struct TenantResolver {
    hosts: HostResolver,
    directory: Arc<dyn OrganizationDirectory>,
}

impl std::fmt::Debug for TenantResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantResolver")
            .field("hosts", &self.hosts)
            .finish_non_exhaustive()
    }
}

impl TenantResolver {
    /// Creates a resolver over the given directory.
    #[must_use]
    pub fn new(hosts: HostResolver, directory: Arc<dyn OrganizationDirectory>) -> Self {
        Self { hosts, directory }
    }

    /// Returns the host classifier.
    #[must_use]
    pub const fn hosts(&self) -> &HostResolver {
        &self.hosts
    }

    /// Resolves a raw host header value to an active organization.
    pub async fn resolve(&self, host: &str) -> Result<TenantContext> {
        let target = self.hosts.classify(host)?;
        debug!(host, ?target, "Classified host");

        let (organization, source) = match target {
            HostTarget::Platform => {
                return Err(SecurityError::unresolved_tenant(normalize_host(host)));
            }
            HostTarget::Subdomain(subdomain) => {
                let organization = self
                    .directory
                    .find_by_subdomain(&subdomain)
                    .await?
                    .ok_or_else(|| SecurityError::unresolved_tenant(&subdomain))?;
                (organization, TenantSource::Subdomain)
            }
            HostTarget::CustomDomain(domain) => {
                let organization = self
                    .directory
                    .find_by_custom_domain(&domain)
                    .await?
                    .ok_or_else(|| SecurityError::unresolved_tenant(&domain))?;
                if organization.verified_custom_domain() != Some(domain.as_str()) {
                    return Err(SecurityError::unverified_domain(domain));
                }
                (organization, TenantSource::CustomDomain)
            }
        };

        if !organization.is_active() {
            debug!(organization_id = %organization.id(), "Organization is suspended");
            return Err(SecurityError::unresolved_tenant(normalize_host(host)));
        }

        debug!(
            organization_id = %organization.id(),
            slug = organization.slug(),
            ?source,
            "Resolved tenant"
        );
        Ok(TenantContext::new(organization, source))
    }

    /// Resolves an organization named by ID rather than by host.
    ///
    /// Callers must have established that the session is a super-admin on
    /// a platform host. Unknown and suspended organizations fail closed.
    pub async fn resolve_impersonation(&self, organization_id: OrganizationId) -> Result<TenantContext> {
        let organization = match self.directory.get(organization_id).await {
            Ok(organization) => organization,
            Err(SecurityError::OrganizationNotFound { .. }) => {
                return Err(SecurityError::unresolved_tenant(organization_id.to_string()));
            }
            Err(e) => return Err(e),
        };

        if !organization.is_active() {
            debug!(organization_id = %organization_id, "Organization is suspended");
            return Err(SecurityError::unresolved_tenant(organization_id.to_string()));
        }

        debug!(
            organization_id = %organization_id,
            slug = organization.slug(),
            "Resolved tenant by impersonation"
        );
        Ok(TenantContext::new(organization, TenantSource::Impersonation))
    }
}
