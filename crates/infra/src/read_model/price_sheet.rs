use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecopricing_core::AggregateRoot;
use ecopricing_pricing::{ChannelPriceSheet, TaxRate};
use ecopricing_products::{CostOrigin, Product, ProductId};

/// Queryable per-product pricing row: the inputs and the derived channel prices
/// as of the last applied product event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPriceRow {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub cost: Decimal,
    pub tax_rate: TaxRate,
    pub prices: ChannelPriceSheet,
    pub last_cost_origin: Option<CostOrigin>,
    pub version: u64,
}

impl ProductPriceRow {
    /// `None` for a product that was never created.
    pub fn from_product(product: &Product) -> Option<Self> {
        if !product.is_created() {
            return None;
        }

        Some(Self {
            product_id: product.id_typed(),
            sku: product.sku().to_string(),
            name: product.name().to_string(),
            cost: product.cost(),
            tax_rate: product.tax_rate(),
            prices: *product.prices(),
            last_cost_origin: product.last_cost_origin().cloned(),
            version: product.version(),
        })
    }
}
