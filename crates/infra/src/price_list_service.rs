//! Price-list computation with channel margin enforcement.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use ecopricing_core::TenantId;
use ecopricing_products::{
    BasePricingEngine, ChannelPriceListResolver, PriceList, PriceListError, PriceRequest,
    Product, ProductId, ProductLookup, RulePrice,
};

use crate::command_dispatcher::DispatchError;
use crate::event_store::EventStore;
use crate::product_store::ProductStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceListServiceError {
    #[error(transparent)]
    PriceList(#[from] PriceListError),
}

/// [`ProductLookup`] over one tenant's products.
pub struct TenantProducts<'a, S> {
    products: &'a ProductStore<S>,
    tenant_id: TenantId,
}

impl<'a, S> TenantProducts<'a, S> {
    pub fn new(products: &'a ProductStore<S>, tenant_id: TenantId) -> Self {
        Self {
            products,
            tenant_id,
        }
    }
}

impl<S> ProductLookup for TenantProducts<'_, S>
where
    S: EventStore,
{
    type Error = DispatchError;

    fn find_product(&self, product_id: ProductId) -> Result<Option<Product>, DispatchError> {
        self.products.load(self.tenant_id, product_id)
    }
}

/// Runs the base engine, then overrides channel-bound lists with the
/// margin-derived, tax-excluded net price.
#[derive(Debug)]
pub struct PriceListService<S, E> {
    products: Arc<ProductStore<S>>,
    engine: E,
}

impl<S, E> PriceListService<S, E>
where
    S: EventStore,
    E: BasePricingEngine,
{
    pub fn new(products: Arc<ProductStore<S>>, engine: E) -> Self {
        Self { products, engine }
    }

    /// Prices for `requests` under `price_list`.
    ///
    /// # Errors
    ///
    /// Fails as a whole when any requested product lacks a usable margin for
    /// the list's channel or cannot be loaded, or when the base engine fails.
    pub fn compute_price_rule(
        &self,
        tenant_id: TenantId,
        price_list: &PriceList,
        requests: &[PriceRequest],
    ) -> Result<HashMap<ProductId, RulePrice>, PriceListServiceError> {
        let lookup = TenantProducts::new(&self.products, tenant_id);
        let resolver = ChannelPriceListResolver::new(&self.engine, lookup);

        match price_list.channel() {
            Some(channel) => tracing::debug!(
                tenant_id = %tenant_id,
                price_list = %price_list.name,
                channel = %channel,
                "resolving channel price list"
            ),
            None => tracing::debug!(
                tenant_id = %tenant_id,
                price_list = %price_list.name,
                "price list has no channel marker; base prices pass through"
            ),
        }

        resolver
            .compute_price_rule(price_list, requests)
            .map_err(|err| {
                match &err {
                    PriceListError::MissingMargin { product_id, channel, .. } => tracing::warn!(
                        tenant_id = %tenant_id,
                        price_list = %price_list.name,
                        product_id = %product_id,
                        channel = %channel,
                        "price list rejected: missing channel margin"
                    ),
                    PriceListError::Lookup { product_id, reason } => tracing::warn!(
                        tenant_id = %tenant_id,
                        price_list = %price_list.name,
                        product_id = %product_id,
                        error = %reason,
                        "price list rejected: product could not be loaded"
                    ),
                    PriceListError::Engine(_) => {}
                }
                PriceListServiceError::from(err)
            })
    }
}
