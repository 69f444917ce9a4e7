//! Channel-bound price lists.
//!
//! A price list whose name carries a channel marker prices products from
//! cost and that channel's live margin instead of its own rules. Lists without
//! a marker are left to the base engine untouched.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ecopricing_core::{AggregateId, DomainError, PartnerId};
use ecopricing_pricing::{Channel, net_price};

use crate::{Product, ProductId};

/// Price list identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceListId(pub AggregateId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceList {
    pub id: PriceListId,
    pub name: String,
}

impl PriceList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PriceListId(AggregateId::new()),
            name: name.into(),
        }
    }

    /// Channel this list is bound to, if its name carries a marker.
    pub fn channel(&self) -> Option<Channel> {
        Channel::for_price_list(&self.name)
    }
}

/// One (product, quantity, partner) tuple to price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub partner: Option<PartnerId>,
}

impl PriceRequest {
    pub fn new(product_id: ProductId, quantity: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            partner: None,
        }
    }

    pub fn for_partner(mut self, partner: PartnerId) -> Self {
        self.partner = Some(partner);
        self
    }
}

/// Price computed for a product and the list rule that produced it.
///
/// Channel overrides carry no rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePrice {
    pub price: Decimal,
    pub rule_id: Option<AggregateId>,
}

/// Native price-list computation, run before any channel override.
pub trait BasePricingEngine {
    fn compute_price_rule(
        &self,
        price_list: &PriceList,
        requests: &[PriceRequest],
    ) -> Result<HashMap<ProductId, RulePrice>, DomainError>;
}

impl<E> BasePricingEngine for &E
where
    E: BasePricingEngine + ?Sized,
{
    fn compute_price_rule(
        &self,
        price_list: &PriceList,
        requests: &[PriceRequest],
    ) -> Result<HashMap<ProductId, RulePrice>, DomainError> {
        (**self).compute_price_rule(price_list, requests)
    }
}

/// Read access to current product state.
///
/// `Ok(None)` means the product does not exist; an error means its state
/// could not be read at all.
pub trait ProductLookup {
    type Error: core::fmt::Display;

    fn find_product(&self, product_id: ProductId) -> Result<Option<Product>, Self::Error>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceListError {
    /// Selling through a channel requires a usable margin for that channel.
    #[error("product \"{product}\" has no margin defined for the {channel} channel of this price list")]
    MissingMargin {
        product_id: ProductId,
        product: String,
        channel: Channel,
    },

    /// Margin enforcement cannot be skipped for a product that failed to load.
    #[error("product {product_id} could not be read for price-list resolution: {reason}")]
    Lookup {
        product_id: ProductId,
        reason: String,
    },

    #[error(transparent)]
    Engine(#[from] DomainError),
}

/// Overrides base results for channel-bound lists with `cost / (1 - margin)`.
///
/// Always tax-excluded: taxes are resolved downstream per partner.
#[derive(Debug, Clone)]
pub struct ChannelPriceListResolver<E, L> {
    engine: E,
    products: L,
}

impl<E, L> ChannelPriceListResolver<E, L>
where
    E: BasePricingEngine,
    L: ProductLookup,
{
    pub fn new(engine: E, products: L) -> Self {
        Self { engine, products }
    }

    /// Price every request on `price_list`.
    ///
    /// Fails as a whole with [`PriceListError::MissingMargin`] as soon as one
    /// product lacks a usable margin (zero, negative or at least 100) for the
    /// list's channel, and with [`PriceListError::Lookup`] when a product's
    /// state cannot be read. Products without a positive cost keep the base
    /// price.
    pub fn compute_price_rule(
        &self,
        price_list: &PriceList,
        requests: &[PriceRequest],
    ) -> Result<HashMap<ProductId, RulePrice>, PriceListError> {
        let mut result = self.engine.compute_price_rule(price_list, requests)?;

        let Some(channel) = price_list.channel() else {
            return Ok(result);
        };

        for request in requests {
            if !result.contains_key(&request.product_id) {
                continue;
            }
            let product = self
                .products
                .find_product(request.product_id)
                .map_err(|err| PriceListError::Lookup {
                    product_id: request.product_id,
                    reason: err.to_string(),
                })?;
            let Some(product) = product else {
                continue;
            };

            let margin = product.margin(channel);
            if !margin.is_priceable() {
                return Err(PriceListError::MissingMargin {
                    product_id: request.product_id,
                    product: product.name().to_string(),
                    channel,
                });
            }

            if product.cost() <= Decimal::ZERO {
                continue;
            }

            result.insert(
                request.product_id,
                RulePrice {
                    price: net_price(product.cost(), margin),
                    rule_id: None,
                },
            );
        }

        Ok(result)
    }
}
