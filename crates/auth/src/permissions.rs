use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. "products.write").
///
/// The wildcard `"*"` grants everything within the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Ordinary product edit right (tax configuration, names).
    pub const PRODUCTS_WRITE: &'static str = "products.write";

    /// Right to record purchase orders and vendor bills.
    pub const PURCHASES_WRITE: &'static str = "purchases.write";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn products_write() -> Self {
        Self(Cow::Borrowed(Self::PRODUCTS_WRITE))
    }

    pub fn purchases_write() -> Self {
        Self(Cow::Borrowed(Self::PURCHASES_WRITE))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
