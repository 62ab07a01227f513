//! Organization lookup and persistence.

use super::organization::{Organization, OrganizationId};
use crate::error::{Result, SecurityError};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Source of organizations for tenant resolution and administration.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    /// Finds the organization owning a platform subdomain.
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Arc<Organization>>>;

    /// Finds the organization owning a custom domain, verified or not.
    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Arc<Organization>>>;

    /// Gets an organization by ID.
    async fn get(&self, id: OrganizationId) -> Result<Arc<Organization>>;

    /// Lists every organization.
    async fn list(&self) -> Result<Vec<Arc<Organization>>>;

    /// Adds a new organization. Slug, subdomain and custom domain must be unused.
    async fn insert(&self, organization: Organization) -> Result<Arc<Organization>>;

    /// Replaces an existing organization. Slug, subdomain and custom domain
    /// must not belong to another organization.
    async fn save(&self, organization: Organization) -> Result<Arc<Organization>>;
}

/// In-process [`OrganizationDirectory`] backed by concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    by_id: DashMap<OrganizationId, Arc<Organization>>,
    by_slug: DashMap<String, OrganizationId>,
    by_subdomain: DashMap<String, OrganizationId>,
    by_domain: DashMap<String, OrganizationId>,
    // Serializes writers so uniqueness checks and index updates are atomic.
    write_lock: Mutex<()>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of organizations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if there are no organizations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn lookup(
        &self,
        index: &DashMap<String, OrganizationId>,
        key: &str,
    ) -> Option<Arc<Organization>> {
        let id = *index.get(key)?.value();
        self.by_id.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    fn check_unique(&self, organization: &Organization) -> Result<()> {
        let id = organization.id();
        let taken_by_other = |index: &DashMap<String, OrganizationId>, key: &str| {
            index.get(key).is_some_and(|entry| *entry.value() != id)
        };

        if taken_by_other(&self.by_slug, organization.slug()) {
            return Err(SecurityError::conflict(format!(
                "slug '{}' is already in use",
                organization.slug()
            )));
        }
        if let Some(subdomain) = organization.subdomain()
            && taken_by_other(&self.by_subdomain, subdomain)
        {
            return Err(SecurityError::conflict(format!(
                "subdomain '{subdomain}' is already in use"
            )));
        }
        if let Some(domain) = organization.custom_domain()
            && taken_by_other(&self.by_domain, domain.domain())
        {
            return Err(SecurityError::conflict(format!(
                "domain '{}' is already in use",
                domain.domain()
            )));
        }
        Ok(())
    }

    fn unindex(&self, organization: &Organization) {
        self.by_slug.remove(organization.slug());
        if let Some(subdomain) = organization.subdomain() {
            self.by_subdomain.remove(subdomain);
        }
        if let Some(domain) = organization.custom_domain() {
            self.by_domain.remove(domain.domain());
        }
    }

    fn index(&self, organization: Organization) -> Arc<Organization> {
        let id = organization.id();
        self.by_slug.insert(organization.slug().to_string(), id);
        if let Some(subdomain) = organization.subdomain() {
            self.by_subdomain.insert(subdomain.to_string(), id);
        }
        if let Some(domain) = organization.custom_domain() {
            self.by_domain.insert(domain.domain().to_string(), id);
        }
        let organization = Arc::new(organization);
        self.by_id.insert(id, Arc::clone(&organization));
        organization
    }
}

#[async_trait]
impl OrganizationDirectory for InMemoryDirectory {
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Arc<Organization>>> {
        Ok(self.lookup(&self.by_subdomain, subdomain))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Arc<Organization>>> {
        Ok(self.lookup(&self.by_domain, domain))
    }

    async fn get(&self, id: OrganizationId) -> Result<Arc<Organization>> {
        self.by_id
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SecurityError::organization_not_found(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Arc<Organization>>> {
        let mut organizations: Vec<_> = self
            .by_id
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        organizations.sort_by(|a, b| a.slug().cmp(b.slug()));
        Ok(organizations)
    }

    async fn insert(&self, organization: Organization) -> Result<Arc<Organization>> {
        let _guard = self.write_lock.lock();

        if self.by_id.contains_key(&organization.id()) {
            return Err(SecurityError::conflict(format!(
                "organization {} already exists",
                organization.id()
            )));
        }
        self.check_unique(&organization)?;

        info!(
            organization_id = %organization.id(),
            slug = organization.slug(),
            "Created organization"
        );
        Ok(self.index(organization))
    }

    async fn save(&self, organization: Organization) -> Result<Arc<Organization>> {
        let _guard = self.write_lock.lock();

        let existing = self
            .by_id
            .get(&organization.id())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SecurityError::organization_not_found(organization.id().to_string()))?;
        self.check_unique(&organization)?;

        self.unindex(&existing);
        debug!(organization_id = %organization.id(), "Updated organization");
        Ok(self.index(organization))
    }
}
