//! Organization (tenant) entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(Uuid);

impl OrganizationId {
    /// Creates a new random organization ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an organization ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrganizationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Administrative status of an organization.
///
/// Organizations are never deleted; suspension takes them offline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationStatus {
    /// Serving requests.
    #[default]
    Active,
    /// Never resolves from any host.
    Suspended,
}

impl OrganizationStatus {
    /// Returns true if the organization can be resolved.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

/// TLS certificate state of a custom domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Not issued yet.
    #[default]
    Pending,
    /// Issued and serving.
    Active,
    /// Issuance failed.
    Failed,
    /// Past its expiry.
    Expired,
}

/// A customer-owned domain mapped to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDomain {
    domain: String,
    verification_token: String,
    verified: bool,
    verified_at: Option<DateTime<Utc>>,
    certificate_status: CertificateStatus,
    certificate_expires_at: Option<DateTime<Utc>>,
}

impl CustomDomain {
    /// Creates an unverified custom domain awaiting the given token.
    #[must_use]
    pub fn new(domain: impl Into<String>, verification_token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            verification_token: verification_token.into(),
            verified: false,
            verified_at: None,
            certificate_status: CertificateStatus::Pending,
            certificate_expires_at: None,
        }
    }

    /// Returns the domain name.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the verification token the owner must publish.
    #[must_use]
    pub fn verification_token(&self) -> &str {
        &self.verification_token
    }

    /// Returns true once ownership has been confirmed.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.verified
    }

    /// Returns when ownership was confirmed.
    #[must_use]
    pub const fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    /// Returns the certificate status.
    #[must_use]
    pub const fn certificate_status(&self) -> CertificateStatus {
        self.certificate_status
    }

    /// Returns the certificate expiry.
    #[must_use]
    pub const fn certificate_expires_at(&self) -> Option<DateTime<Utc>> {
        self.certificate_expires_at
    }

    /// Marks the domain verified.
    pub fn mark_verified(&mut self, at: DateTime<Utc>) {
        self.verified = true;
        self.verified_at = Some(at);
    }

    /// Records a certificate state change.
    pub fn set_certificate(
        &mut self,
        status: CertificateStatus,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.certificate_status = status;
        self.certificate_expires_at = expires_at;
    }
}

/// Visual identity of an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    /// Logo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Primary color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    /// Secondary color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
}

/// A customer organization (community association).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    name: String,
    slug: String,
    subdomain: Option<String>,
    custom_domain: Option<CustomDomain>,
    features: BTreeMap<String, bool>,
    plan: Option<String>,
    branding: Branding,
    status: OrganizationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates an active organization with no domains.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            slug: slug.into(),
            subdomain: None,
            custom_domain: None,
            features: BTreeMap::new(),
            plan: None,
            branding: Branding::default(),
            status: OrganizationStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Uses a fixed ID.
    #[must_use]
    pub fn with_id(mut self, id: OrganizationId) -> Self {
        self.id = id;
        self
    }

    /// Sets the platform subdomain.
    #[must_use]
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// Sets a feature flag.
    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    /// Sets the subscription plan.
    #[must_use]
    pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    /// Sets the branding.
    #[must_use]
    pub fn with_branding(mut self, branding: Branding) -> Self {
        self.branding = branding;
        self
    }

    /// Attaches a custom domain as-is.
    #[must_use]
    pub fn with_custom_domain(mut self, custom_domain: CustomDomain) -> Self {
        self.custom_domain = Some(custom_domain);
        self
    }

    /// Returns the organization ID.
    #[must_use]
    pub const fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Returns the platform subdomain.
    #[must_use]
    pub fn subdomain(&self) -> Option<&str> {
        self.subdomain.as_deref()
    }

    /// Returns the custom domain record.
    #[must_use]
    pub const fn custom_domain(&self) -> Option<&CustomDomain> {
        self.custom_domain.as_ref()
    }

    /// Returns the custom domain only when it is verified.
    #[must_use]
    pub fn verified_custom_domain(&self) -> Option<&str> {
        self.custom_domain
            .as_ref()
            .filter(|d| d.is_verified())
            .map(CustomDomain::domain)
    }

    /// Returns all feature flags.
    #[must_use]
    pub const fn features(&self) -> &BTreeMap<String, bool> {
        &self.features
    }

    /// Returns true if the flag is present and enabled.
    #[must_use]
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    /// Returns the subscription plan.
    #[must_use]
    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    /// Returns the branding.
    #[must_use]
    pub const fn branding(&self) -> &Branding {
        &self.branding
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> OrganizationStatus {
        self.status
    }

    /// Returns true if the organization can be resolved.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the subdomain.
    pub fn set_subdomain(&mut self, subdomain: Option<String>) {
        self.subdomain = subdomain;
        self.touch();
    }

    /// Sets a new custom domain. Verification and certificate state start over.
    pub fn set_custom_domain(&mut self, domain: impl Into<String>, token: impl Into<String>) {
        self.custom_domain = Some(CustomDomain::new(domain, token));
        self.touch();
    }

    /// Removes the custom domain and all of its state.
    pub fn clear_custom_domain(&mut self) {
        self.custom_domain = None;
        self.touch();
    }

    /// Marks the custom domain verified. Returns false if there is none.
    pub fn mark_domain_verified(&mut self, at: DateTime<Utc>) -> bool {
        let Some(domain) = self.custom_domain.as_mut() else {
            return false;
        };
        domain.mark_verified(at);
        self.touch();
        true
    }

    /// Suspends the organization.
    pub fn suspend(&mut self) {
        self.status = OrganizationStatus::Suspended;
        self.touch();
    }

    /// Reactivates the organization.
    pub fn activate(&mut self) {
        self.status = OrganizationStatus::Active;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Canonical URL: verified custom domain, then subdomain, then the platform apex.
    #[must_use]
    pub fn tenant_url(&self, base_domain: &str, secure: bool) -> String {
        let scheme = if secure { "https" } else { "http" };
        if let Some(domain) = self.verified_custom_domain() {
            return format!("{scheme}://{domain}");
        }
        match &self.subdomain {
            Some(subdomain) => format!("{scheme}://{subdomain}.{base_domain}"),
            None => format!("{scheme}://{base_domain}"),
        }
    }
}
