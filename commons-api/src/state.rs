//! Application state for the API server.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use commons_core::config::TenancyConfig;
use commons_security::scope::{MemoryStore, QueryExecutor, ScopedClient, TenantScope};
use commons_security::tenant::{
    HostResolver, InMemoryDirectory, OrganizationDirectory, TenantContext, TenantResolver,
};

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
///
/// Holds configuration and shared services only. Nothing here is tenant
/// specific: the tenant travels with each request.
pub struct AppState {
    /// API configuration
    pub config: ApiConfig,
    /// Tenancy configuration
    pub tenancy: TenancyConfig,
    jwt_manager: Arc<JwtManager>,
    resolver: Arc<TenantResolver>,
    directory: Arc<dyn OrganizationDirectory>,
    store: Arc<dyn QueryExecutor>,
    started_at: DateTime<Utc>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("tenancy", &self.tenancy)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates the application state over the given directory and store.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        tenancy: TenancyConfig,
        directory: Arc<dyn OrganizationDirectory>,
        store: Arc<dyn QueryExecutor>,
    ) -> Self {
        let jwt_manager = Arc::new(JwtManager::new(&config.jwt));
        let resolver = Arc::new(TenantResolver::new(
            HostResolver::new(&tenancy),
            Arc::clone(&directory),
        ));

        Self {
            config,
            tenancy,
            jwt_manager,
            resolver,
            directory,
            store,
            started_at: Utc::now(),
        }
    }

    /// Creates the application state backed by in-process storage.
    #[must_use]
    pub fn in_memory(config: ApiConfig, tenancy: TenancyConfig) -> Self {
        Self::new(
            config,
            tenancy,
            Arc::new(InMemoryDirectory::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Returns a reference to the JWT manager.
    #[must_use]
    pub fn jwt_manager(&self) -> &Arc<JwtManager> {
        &self.jwt_manager
    }

    /// Returns the host-to-tenant resolver.
    #[must_use]
    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// Returns the organization directory.
    #[must_use]
    pub fn directory(&self) -> &Arc<dyn OrganizationDirectory> {
        &self.directory
    }

    /// Returns a data client bound to the request's tenant.
    #[must_use]
    pub fn scoped_client(&self, tenant: &TenantContext) -> ScopedClient {
        let scope =
            TenantScope::from_context(tenant).with_result_validation(self.tenancy.validate_results);
        ScopedClient::new(Arc::clone(&self.store), scope)
    }

    /// Returns when the state was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons_security::tenant::{Organization, TenantSource};

    #[test]
    fn test_scoped_client_is_bound_to_tenant() {
        let state = AppState::in_memory(ApiConfig::default(), TenancyConfig::default());
        let org = Organization::new("Acme", "acme").with_subdomain("acme");
        let id = org.id();
        let tenant = TenantContext::new(Arc::new(org), TenantSource::Subdomain);

        let client = state.scoped_client(&tenant);
        assert_eq!(client.scope().organization_id(), id);
        assert_eq!(state.resolver().hosts().base_domain(), "platform.com");
    }
}
