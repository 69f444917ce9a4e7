//! Infrastructure layer: event storage, tenant-isolated read models, document
//! hooks, pricing services and configuration.
//!
//! Domain crates stay pure; this crate loads aggregates, runs commands against
//! them, persists the outcome and reacts to purchase document transitions.

pub mod command_dispatcher;
pub mod config;
pub mod documents;
pub mod event_store;
pub mod price_list_service;
pub mod pricing_service;
pub mod product_store;
pub mod read_model;
mod sync;

pub use command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
pub use config::{ConfigError, PricingConfig, build_pricing_config, load_pricing_config};
pub use documents::{DocumentOutcome, DocumentWorkflow, DocumentWorkflowError};
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent};
pub use price_list_service::{PriceListService, PriceListServiceError, TenantProducts};
pub use pricing_service::{PricingService, PricingServiceError};
pub use product_store::ProductStore;
pub use read_model::{InMemoryTenantStore, ProductPriceRow, TenantStore};
pub use sync::SyncReport;
