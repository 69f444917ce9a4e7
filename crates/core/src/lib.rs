//! `ecopricing-core`: shared domain building blocks.
//!
//! Identifiers, the domain error model and the aggregate contract used by the
//! products, purchasing and invoicing crates. No IO lives here.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, PartnerId, TenantId};
pub use value_object::ValueObject;
