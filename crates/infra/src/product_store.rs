//! Event-sourced product storage with an inline price read model.

use chrono::Utc;
use rust_decimal::Decimal;

use ecopricing_auth::PrincipalId;
use ecopricing_core::{AggregateId, TenantId};
use ecopricing_events::EventEnvelope;
use ecopricing_products::{
    CostOrigin, CostUpdated, Product, ProductCommand, ProductEvent, ProductId, UpdateCost,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
use crate::event_store::EventStore;
use crate::read_model::{InMemoryTenantStore, ProductPriceRow, TenantStore};

pub const PRODUCT_AGGREGATE_TYPE: &str = "products.product";

fn make_product(_tenant_id: TenantId, id: AggregateId) -> Product {
    Product::empty(ProductId::new(id))
}

/// Products of every tenant, one event stream each.
///
/// Mutations are crate-private: outside callers change a product through
/// [`crate::PricingService`] (authorized) or through purchase documents
/// ([`crate::DocumentWorkflow`]).
#[derive(Debug)]
pub struct ProductStore<S> {
    dispatcher: CommandDispatcher<S>,
    prices: InMemoryTenantStore<ProductId, ProductPriceRow>,
}

impl<S> ProductStore<S>
where
    S: EventStore,
{
    pub fn new(store: S) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
            prices: InMemoryTenantStore::new(),
        }
    }

    /// Current product state, `None` when the product was never created.
    pub fn load(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<Product>, DispatchError> {
        let product = self.dispatcher.load(tenant_id, product_id.0, make_product)?;
        Ok(product.is_created().then_some(product))
    }

    pub fn price_row(&self, tenant_id: TenantId, product_id: ProductId) -> Option<ProductPriceRow> {
        self.prices.get(tenant_id, &product_id)
    }

    pub fn price_rows(&self, tenant_id: TenantId) -> Vec<ProductPriceRow> {
        self.prices.list(tenant_id)
    }

    /// Committed product events, oldest first.
    pub fn history(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Vec<EventEnvelope<ProductEvent>>, DispatchError> {
        let stream = self.dispatcher.store().load_stream(tenant_id, product_id.0)?;
        stream
            .iter()
            .map(|stored| {
                stored.to_envelope().try_map(|payload| {
                    serde_json::from_value(payload)
                        .map_err(|e| DispatchError::Deserialize(e.to_string()))
                })
            })
            .collect()
    }

    /// Rebuild the price rows of `tenant_id` from the event streams of `products`.
    pub fn rebuild_prices(
        &self,
        tenant_id: TenantId,
        products: &[ProductId],
    ) -> Result<usize, DispatchError> {
        self.prices.clear_tenant(tenant_id);
        let mut rebuilt = 0;
        for product_id in products {
            if let Some(product) = self.load(tenant_id, *product_id)? {
                self.refresh(tenant_id, &product);
                rebuilt += 1;
            }
        }
        Ok(rebuilt)
    }

    pub(crate) fn execute(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        command: &ProductCommand,
    ) -> Result<Dispatched<Product>, DispatchError> {
        let out = self.dispatcher.dispatch(
            tenant_id,
            product_id.0,
            PRODUCT_AGGREGATE_TYPE,
            command,
            make_product,
        )?;
        if !out.events.is_empty() {
            self.refresh(tenant_id, &out.aggregate);
        }
        Ok(out)
    }

    /// Ungated cost write. Callers are the document hooks and the authorized
    /// manual path; both check their own preconditions first. `actor` is the
    /// principal whose action caused the write and is only recorded.
    ///
    /// Returns the `CostUpdated` event, or `None` when the cost already matched.
    pub(crate) fn sync_cost(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        product_id: ProductId,
        cost: Decimal,
        origin: CostOrigin,
    ) -> Result<Option<CostUpdated>, DispatchError> {
        let command = ProductCommand::UpdateCost(UpdateCost {
            tenant_id,
            product_id,
            cost,
            origin,
            occurred_at: Utc::now(),
        });

        let out = self.execute(tenant_id, product_id, &command)?;
        let updated = out.events.into_iter().find_map(|ev| match ev {
            ProductEvent::CostUpdated(e) => Some(e),
            _ => None,
        });

        if let Some(e) = &updated {
            tracing::info!(
                tenant_id = %tenant_id,
                principal_id = %actor,
                product_id = %product_id,
                origin = ?e.origin,
                previous = %e.previous,
                cost = %e.cost,
                "product cost updated"
            );
        }

        Ok(updated)
    }

    fn refresh(&self, tenant_id: TenantId, product: &Product) {
        if let Some(row) = ProductPriceRow::from_product(product) {
            self.prices.upsert(tenant_id, row.product_id, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecopricing_pricing::{Channel, ChannelMargins, MarginPercent, SaleTax};
    use ecopricing_products::CreateProduct;

    use crate::event_store::InMemoryEventStore;

    fn store_with_product(tenant_id: TenantId) -> (ProductStore<InMemoryEventStore>, ProductId) {
        let store = ProductStore::new(InMemoryEventStore::new());
        let product_id = ProductId::new(AggregateId::new());
        let create = ProductCommand::CreateProduct(CreateProduct {
            tenant_id,
            product_id,
            sku: "TEA-250".to_string(),
            name: "Green tea 250g".to_string(),
            cost: Decimal::from(80),
            margins: ChannelMargins::default()
                .with(Channel::Tat, MarginPercent::new(Decimal::from(20))),
            sale_taxes: vec![SaleTax::percent("iva19", "IVA 19%", Decimal::from(19))],
            occurred_at: Utc::now(),
        });
        store.execute(tenant_id, product_id, &create).unwrap();
        (store, product_id)
    }

    #[test]
    fn created_product_gets_a_price_row() {
        let tenant_id = TenantId::new();
        let (store, product_id) = store_with_product(tenant_id);

        let row = store.price_row(tenant_id, product_id).unwrap();
        assert_eq!(row.prices.get(Channel::Tat).net, Decimal::from(100));
        assert_eq!(row.prices.get(Channel::Tat).gross, Decimal::from(119));
        assert!(store.price_row(TenantId::new(), product_id).is_none());
    }

    #[test]
    fn sync_cost_reports_only_real_changes() {
        let tenant_id = TenantId::new();
        let (store, product_id) = store_with_product(tenant_id);

        let first = store
            .sync_cost(PrincipalId::new(), tenant_id, product_id, Decimal::from(60), CostOrigin::Manual)
            .unwrap()
            .unwrap();
        assert_eq!(first.previous, Decimal::from(80));

        let again = store
            .sync_cost(PrincipalId::new(), tenant_id, product_id, Decimal::from(60), CostOrigin::Manual)
            .unwrap();
        assert!(again.is_none());
        let history = store.history(tenant_id, product_id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].is("products.product.cost_updated"));
        assert_eq!(history[1].position.sequence, 2);
        assert!(matches!(
            &history[1].payload,
            ProductEvent::CostUpdated(e) if e.cost == Decimal::from(60)
        ));
        assert_eq!(store.price_row(tenant_id, product_id).unwrap().cost, Decimal::from(60));
    }

    #[test]
    fn load_of_unknown_product_is_none() {
        let store = ProductStore::new(InMemoryEventStore::new());
        let loaded = store
            .load(TenantId::new(), ProductId::new(AggregateId::new()))
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn rebuild_restores_rows_from_streams() {
        let tenant_id = TenantId::new();
        let (store, product_id) = store_with_product(tenant_id);
        let before = store.price_row(tenant_id, product_id).unwrap();

        let rebuilt = store.rebuild_prices(tenant_id, &[product_id]).unwrap();
        assert_eq!(rebuilt, 1);
        assert_eq!(store.price_row(tenant_id, product_id), Some(before));
    }
}
