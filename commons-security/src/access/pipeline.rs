//! Authentication and authorization pipeline.
//!
//! A request moves `Unauthenticated -> Authenticated -> Authorized`. Each
//! transition returns a `Result`; a failed one ends the request and the
//! handler never runs.

use super::principal::{Principal, Role};
use crate::error::{Result, SecurityError};
use crate::tenant::TenantContext;
use tracing::debug;

/// Route protection levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Any valid session.
    Authenticated,
    /// Session whose organization is the resolved tenant (super-admins pass).
    Tenant,
    /// [`Guard::Tenant`] and at least [`Role::BoardMember`].
    TenantBoard,
    /// [`Guard::Tenant`] and at least [`Role::Admin`].
    TenantAdmin,
    /// [`Role::SuperAdmin`]; tenant matching is bypassed.
    SuperAdmin,
}

impl Guard {
    /// Runs the whole pipeline for this guard.
    pub fn check(
        self,
        principal: Option<Principal>,
        tenant: Option<&TenantContext>,
    ) -> Result<Authorized> {
        let authenticated = authenticate(principal)?;
        match self {
            Self::Authenticated => Ok(authenticated.into_authorized()),
            Self::Tenant => authenticated.require_tenant(tenant),
            Self::TenantBoard => authenticated.require_tenant_role(tenant, Role::BoardMember),
            Self::TenantAdmin => authenticated.require_tenant_role(tenant, Role::Admin),
            Self::SuperAdmin => authenticated.require_super_admin(),
        }
    }
}

/// First stage: a session is present.
pub fn authenticate(principal: Option<Principal>) -> Result<Authenticated> {
    principal
        .map(|principal| Authenticated { principal })
        .ok_or_else(|| SecurityError::unauthenticated("no valid session"))
}

/// A request with a valid session, not yet authorized.
#[derive(Debug, Clone)]
pub struct Authenticated {
    principal: Principal,
}

impl Authenticated {
    /// Returns the session principal.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Authorizes without further checks.
    #[must_use]
    pub fn into_authorized(self) -> Authorized {
        Authorized {
            principal: self.principal,
            tenant: None,
        }
    }

    /// Requires the principal to belong to the resolved tenant.
    pub fn require_tenant(self, tenant: Option<&TenantContext>) -> Result<Authorized> {
        let tenant = TenantContext::require(tenant)?;
        let organization_id = tenant.organization_id();

        if !self.principal.role.is_super_admin() && !self.principal.belongs_to(organization_id) {
            debug!(
                user_id = %self.principal.user_id,
                organization_id = %organization_id,
                "Session does not belong to tenant"
            );
            return Err(SecurityError::tenant_mismatch(
                &self.principal.user_id,
                organization_id.to_string(),
            ));
        }

        Ok(Authorized {
            principal: self.principal,
            tenant: Some(tenant.clone()),
        })
    }

    /// Requires tenant membership and a minimum role.
    pub fn require_tenant_role(
        self,
        tenant: Option<&TenantContext>,
        minimum: Role,
    ) -> Result<Authorized> {
        let authorized = self.require_tenant(tenant)?;
        if !authorized.principal.role.at_least(minimum) {
            return Err(SecurityError::insufficient_role(
                &authorized.principal.user_id,
                minimum.as_str(),
            ));
        }
        Ok(authorized)
    }

    /// Requires a platform operator.
    pub fn require_super_admin(self) -> Result<Authorized> {
        if !self.principal.role.is_super_admin() {
            return Err(SecurityError::insufficient_role(
                &self.principal.user_id,
                Role::SuperAdmin.as_str(),
            ));
        }
        Ok(self.into_authorized())
    }
}

/// A request allowed to reach its handler.
#[derive(Debug, Clone)]
pub struct Authorized {
    principal: Principal,
    tenant: Option<TenantContext>,
}

impl Authorized {
    /// Returns the session principal.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the tenant the request was authorized against, if any.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantContext> {
        self.tenant.as_ref()
    }

    /// Raises the role floor for a single operation.
    pub fn require_role(&self, minimum: Role) -> Result<()> {
        if self.principal.role.at_least(minimum) {
            Ok(())
        } else {
            Err(SecurityError::insufficient_role(
                &self.principal.user_id,
                minimum.as_str(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::{Organization, TenantSource};
    use std::sync::Arc;

    fn tenant() -> TenantContext {
        TenantContext::new(
            Arc::new(Organization::new("Acme", "acme").with_subdomain("acme")),
            TenantSource::Subdomain,
        )
    }

    #[test]
    fn test_missing_session_is_unauthenticated() {
        for guard in [
            Guard::Authenticated,
            Guard::Tenant,
            Guard::TenantBoard,
            Guard::TenantAdmin,
            Guard::SuperAdmin,
        ] {
            let err = guard.check(None, Some(&tenant())).unwrap_err();
            assert!(err.is_authentication_error(), "{guard:?}");
        }
    }

    #[test]
    fn test_member_of_tenant_is_authorized() {
        let tenant = tenant();
        let user = Principal::member("u1", Role::Resident, tenant.organization_id());
        let authorized = Guard::Tenant.check(Some(user), Some(&tenant)).unwrap();
        assert_eq!(authorized.principal().user_id, "u1");
        assert_eq!(
            authorized.tenant().map(TenantContext::organization_id),
            Some(tenant.organization_id())
        );
    }

    #[test]
    fn test_member_of_other_org_is_rejected() {
        let tenant = tenant();
        let outsider = Principal::member("u2", Role::Admin, Organization::new("B", "b").id());
        let err = Guard::Tenant.check(Some(outsider), Some(&tenant)).unwrap_err();
        assert!(matches!(err, SecurityError::TenantMismatch { .. }));
    }

    #[test]
    fn test_tenant_guard_without_tenant_fails_closed() {
        let user = Principal::member("u1", Role::Admin, tenant().organization_id());
        let err = Guard::Tenant.check(Some(user), None).unwrap_err();
        assert!(matches!(err, SecurityError::UnresolvedTenant { .. }));
    }

    #[test]
    fn test_super_admin_passes_tenant_guards() {
        let tenant = tenant();
        for guard in [Guard::Tenant, Guard::TenantBoard, Guard::TenantAdmin, Guard::SuperAdmin] {
            assert!(
                guard
                    .check(Some(Principal::super_admin("root")), Some(&tenant))
                    .is_ok(),
                "{guard:?}"
            );
        }
        assert!(
            Guard::SuperAdmin
                .check(Some(Principal::super_admin("root")), None)
                .is_ok()
        );
    }

    #[test]
    fn test_role_floors() {
        let tenant = tenant();
        let id = tenant.organization_id();
        let resident = Principal::member("r", Role::Resident, id);
        let board = Principal::member("b", Role::BoardMember, id);
        let admin = Principal::member("a", Role::Admin, id);

        assert!(matches!(
            Guard::TenantBoard.check(Some(resident), Some(&tenant)),
            Err(SecurityError::InsufficientRole { .. })
        ));
        assert!(Guard::TenantBoard.check(Some(board.clone()), Some(&tenant)).is_ok());
        assert!(Guard::TenantAdmin.check(Some(board), Some(&tenant)).is_err());
        assert!(Guard::TenantAdmin.check(Some(admin.clone()), Some(&tenant)).is_ok());
        assert!(matches!(
            Guard::SuperAdmin.check(Some(admin), Some(&tenant)),
            Err(SecurityError::InsufficientRole { .. })
        ));
    }

    #[test]
    fn test_require_role_after_authorization() {
        let tenant = tenant();
        let resident = Principal::member("r", Role::Resident, tenant.organization_id());
        let authorized = Guard::Tenant.check(Some(resident), Some(&tenant)).unwrap();
        assert!(authorized.require_role(Role::Resident).is_ok());
        assert!(authorized.require_role(Role::BoardMember).is_err());
    }
}
