//! Products domain module (event-sourced).
//!
//! A product carries its acquisition cost, one contribution margin per sales
//! channel and its sale taxes. Channel prices are derived from those inputs
//! whenever one of them changes. The price-list resolver overrides base
//! price-list results for channel-bound lists.

pub mod pricelist;
pub mod product;

pub use pricelist::{
    BasePricingEngine, ChannelPriceListResolver, PriceList, PriceListError, PriceListId,
    PriceRequest, ProductLookup, RulePrice,
};
pub use product::{
    CostOrigin, CostUpdated, CreateProduct, MarginChanged, Product, ProductCommand,
    ProductCreated, ProductEvent, ProductId, SaleTaxesChanged, SetMargin, SetSaleTaxes,
    UpdateCost,
};
