use thiserror::Error;

use ecopricing_core::TenantId;

use crate::{Permission, PrincipalId, Role, TenantMembership};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
}

impl Principal {
    /// Principal acting inside the tenant its membership belongs to.
    pub fn new(
        principal_id: PrincipalId,
        tenant_id: TenantId,
        roles: Vec<Role>,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            principal_id,
            active_tenant_id: tenant_id,
            membership: TenantMembership {
                tenant_id,
                roles,
                permissions,
            },
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.membership.has_role(role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: only members of role '{0}' may change cost or channel margins")]
    MissingRole(String),
}

fn ensure_tenant(principal: &Principal, tenant_id: TenantId) -> Result<(), AuthzError> {
    if principal.active_tenant_id != principal.membership.tenant_id
        || principal.active_tenant_id != tenant_id
    {
        return Err(AuthzError::TenantMismatch);
    }
    Ok(())
}

/// Check that the principal holds `required` inside `tenant_id`.
///
/// Pure policy check: no IO, no panics.
pub fn authorize(
    principal: &Principal,
    tenant_id: TenantId,
    required: &Permission,
) -> Result<(), AuthzError> {
    ensure_tenant(principal, tenant_id)?;

    if principal.membership.has_permission(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Check that the principal is a member of `role` inside `tenant_id`.
///
/// Role membership is exact; a wildcard permission does not imply a role.
pub fn require_role(
    principal: &Principal,
    tenant_id: TenantId,
    role: &Role,
) -> Result<(), AuthzError> {
    ensure_tenant(principal, tenant_id)?;

    if principal.has_role(role) {
        Ok(())
    } else {
        Err(AuthzError::MissingRole(role.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(tenant_id: TenantId, roles: Vec<Role>, perms: Vec<Permission>) -> Principal {
        Principal::new(PrincipalId::new(), tenant_id, roles, perms)
    }

    #[test]
    fn pricing_manager_passes_role_check() {
        let tenant_id = TenantId::new();
        let p = principal(tenant_id, vec![Role::pricing_manager()], vec![]);
        assert!(require_role(&p, tenant_id, &Role::pricing_manager()).is_ok());
    }

    #[test]
    fn missing_role_is_rejected_with_role_name() {
        let tenant_id = TenantId::new();
        let p = principal(tenant_id, vec![Role::new("purchase_clerk")], vec![]);
        let err = require_role(&p, tenant_id, &Role::pricing_manager()).unwrap_err();
        assert_eq!(err, AuthzError::MissingRole("pricing_manager".to_string()));
        assert!(err.to_string().contains("pricing_manager"));
    }

    #[test]
    fn wildcard_permission_does_not_grant_role() {
        let tenant_id = TenantId::new();
        let p = principal(tenant_id, vec![], vec![Permission::new("*")]);
        assert!(require_role(&p, tenant_id, &Role::pricing_manager()).is_err());
        assert!(authorize(&p, tenant_id, &Permission::products_write()).is_ok());
    }

    #[test]
    fn acting_in_foreign_tenant_is_a_tenant_mismatch() {
        let p = principal(TenantId::new(), vec![Role::pricing_manager()], vec![]);
        let other = TenantId::new();
        assert_eq!(
            require_role(&p, other, &Role::pricing_manager()),
            Err(AuthzError::TenantMismatch)
        );
        assert_eq!(
            authorize(&p, other, &Permission::products_write()),
            Err(AuthzError::TenantMismatch)
        );
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let tenant_id = TenantId::new();
        let p = principal(tenant_id, vec![], vec![Permission::new("sales.read")]);
        assert_eq!(
            authorize(&p, tenant_id, &Permission::products_write()),
            Err(AuthzError::Forbidden("products.write".to_string()))
        );
    }

    #[test]
    fn purchase_right_needs_no_pricing_role() {
        let tenant_id = TenantId::new();
        let clerk = principal(tenant_id, vec![], vec![Permission::purchases_write()]);
        assert!(authorize(&clerk, tenant_id, &Permission::purchases_write()).is_ok());
        assert!(authorize(&clerk, tenant_id, &Permission::products_write()).is_err());
    }
}
