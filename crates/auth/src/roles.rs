use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings; which role carries pricing authority is decided
/// by configuration, with [`Role::PRICING_MANAGER`] as the default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Default name of the role allowed to edit cost and channel margins by hand.
    pub const PRICING_MANAGER: &'static str = "pricing_manager";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn pricing_manager() -> Self {
        Self(Cow::Borrowed(Self::PRICING_MANAGER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
