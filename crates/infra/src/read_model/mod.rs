//! Tenant-isolated read models rebuilt from product state.

pub mod price_sheet;
pub mod tenant_store;

pub use price_sheet::ProductPriceRow;
pub use tenant_store::{InMemoryTenantStore, TenantStore};
