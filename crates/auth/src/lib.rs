//! `ecopricing-auth`: role and permission checks for manual pricing edits.
//!
//! Decoupled from transport and storage: callers build a [`Principal`] and
//! pass it explicitly into every mutating call.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize, require_role};
pub use permissions::Permission;
pub use principal::{PrincipalId, TenantMembership};
pub use roles::Role;
