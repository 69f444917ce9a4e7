//! Authorized manual edits of cost, margins and sale taxes, and price reads.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use ecopricing_auth::{AuthzError, Permission, Principal, authorize, require_role};
use ecopricing_core::{PartnerId, TenantId};
use ecopricing_pricing::{
    Channel, ChannelPriceSheet, MarginPercent, ProductTaxResolver, SaleTax, TaxResolver,
};
use ecopricing_products::{
    CostOrigin, CreateProduct, Product, ProductCommand, ProductId, SetMargin, SetSaleTaxes,
};

use crate::command_dispatcher::DispatchError;
use crate::config::PricingConfig;
use crate::event_store::EventStore;
use crate::product_store::ProductStore;

#[derive(Debug, Error)]
pub enum PricingServiceError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Dispatch(DispatchError),
}

impl From<DispatchError> for PricingServiceError {
    fn from(value: DispatchError) -> Self {
        PricingServiceError::Dispatch(value)
    }
}

/// Gated entry point for manual pricing changes.
///
/// Cost and margin writes need the configured pricing role; the tax set needs
/// the ordinary `products.write` permission. Derived prices have no setter.
#[derive(Debug)]
pub struct PricingService<S> {
    products: Arc<ProductStore<S>>,
    config: PricingConfig,
    taxes: Arc<dyn TaxResolver>,
}

impl<S> PricingService<S>
where
    S: EventStore,
{
    pub fn new(products: Arc<ProductStore<S>>, config: PricingConfig) -> Self {
        Self {
            products,
            config,
            taxes: Arc::new(ProductTaxResolver),
        }
    }

    /// Resolver used for partner-specific gross prices.
    pub fn with_tax_resolver(mut self, resolver: impl TaxResolver + 'static) -> Self {
        self.taxes = Arc::new(resolver);
        self
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Register a product. Seeding a cost or a margin at creation also needs
    /// the pricing role.
    pub fn create_product(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        cmd: CreateProduct,
    ) -> Result<Product, PricingServiceError> {
        self.check_permission(principal, tenant_id, "create_product")?;
        let seeds_pricing = !cmd.cost.is_zero()
            || Channel::ALL.iter().any(|c| !cmd.margins.get(*c).percent().is_zero());
        if seeds_pricing {
            self.check_pricing_role(principal, tenant_id, "create_product")?;
        }

        let product_id = cmd.product_id;
        let cmd = CreateProduct { tenant_id, ..cmd };
        let out = self
            .products
            .execute(tenant_id, product_id, &ProductCommand::CreateProduct(cmd))?;
        Ok(out.aggregate)
    }

    pub fn set_cost(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        product_id: ProductId,
        cost: Decimal,
    ) -> Result<ChannelPriceSheet, PricingServiceError> {
        self.check_pricing_role(principal, tenant_id, "set_cost")?;

        self.products
            .sync_cost(principal.principal_id, tenant_id, product_id, cost, CostOrigin::Manual)
            .map_err(|e| product_error(e, product_id))?;
        self.channel_prices(tenant_id, product_id)
    }

    pub fn set_margin(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        product_id: ProductId,
        channel: Channel,
        margin: MarginPercent,
    ) -> Result<ChannelPriceSheet, PricingServiceError> {
        self.check_pricing_role(principal, tenant_id, "set_margin")?;

        let cmd = ProductCommand::SetMargin(SetMargin {
            tenant_id,
            product_id,
            channel,
            margin,
            occurred_at: Utc::now(),
        });
        let out = self
            .products
            .execute(tenant_id, product_id, &cmd)
            .map_err(|e| product_error(e, product_id))?;
        Ok(*out.aggregate.prices())
    }

    pub fn set_sale_taxes(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        product_id: ProductId,
        sale_taxes: Vec<SaleTax>,
    ) -> Result<ChannelPriceSheet, PricingServiceError> {
        self.check_permission(principal, tenant_id, "set_sale_taxes")?;

        let cmd = ProductCommand::SetSaleTaxes(SetSaleTaxes {
            tenant_id,
            product_id,
            sale_taxes,
            occurred_at: Utc::now(),
        });
        let out = self
            .products
            .execute(tenant_id, product_id, &cmd)
            .map_err(|e| product_error(e, product_id))?;
        Ok(*out.aggregate.prices())
    }

    /// Derived net/gross prices as stored (exact).
    pub fn channel_prices(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<ChannelPriceSheet, PricingServiceError> {
        self.products
            .price_row(tenant_id, product_id)
            .map(|row| row.prices)
            .ok_or(PricingServiceError::ProductNotFound(product_id))
    }

    /// Derived prices with gross resolved for `partner`: the product's sale
    /// taxes go through the configured [`TaxResolver`], net is unchanged.
    pub fn channel_prices_for_partner(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        partner: Option<PartnerId>,
    ) -> Result<ChannelPriceSheet, PricingServiceError> {
        let product = self
            .products
            .load(tenant_id, product_id)?
            .ok_or(PricingServiceError::ProductNotFound(product_id))?;
        let rate = self.taxes.resolve(product.sale_taxes(), partner);
        Ok(product.prices().with_tax_rate(rate))
    }

    /// Derived prices rounded to the configured scale for presentation.
    pub fn channel_prices_rounded(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<ChannelPriceSheet, PricingServiceError> {
        Ok(self
            .channel_prices(tenant_id, product_id)?
            .rounded(self.config.price_scale))
    }

    fn check_pricing_role(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        operation: &'static str,
    ) -> Result<(), PricingServiceError> {
        require_role(principal, tenant_id, &self.config.pricing_role).map_err(|err| {
            tracing::warn!(
                tenant_id = %tenant_id,
                principal_id = %principal.principal_id,
                operation,
                error = %err,
                "manual pricing edit rejected"
            );
            PricingServiceError::Unauthorized(err)
        })
    }

    fn check_permission(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        operation: &'static str,
    ) -> Result<(), PricingServiceError> {
        authorize(principal, tenant_id, &Permission::products_write()).map_err(|err| {
            tracing::warn!(
                tenant_id = %tenant_id,
                principal_id = %principal.principal_id,
                operation,
                error = %err,
                "product edit rejected"
            );
            PricingServiceError::Unauthorized(err)
        })
    }
}

fn product_error(err: DispatchError, product_id: ProductId) -> PricingServiceError {
    match err {
        DispatchError::NotFound => PricingServiceError::ProductNotFound(product_id),
        other => PricingServiceError::Dispatch(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecopricing_auth::{PrincipalId, Role};
    use ecopricing_core::AggregateId;
    use ecopricing_pricing::{ChannelMargins, FiscalPosition, FiscalPositionResolver, TaxId};

    use crate::event_store::InMemoryEventStore;

    fn service() -> PricingService<InMemoryEventStore> {
        let products = Arc::new(ProductStore::new(InMemoryEventStore::new()));
        PricingService::new(products, PricingConfig::default())
    }

    fn manager(tenant_id: TenantId) -> Principal {
        Principal::new(
            PrincipalId::new(),
            tenant_id,
            vec![Role::pricing_manager()],
            vec![Permission::products_write()],
        )
    }

    fn clerk(tenant_id: TenantId) -> Principal {
        Principal::new(
            PrincipalId::new(),
            tenant_id,
            vec![],
            vec![Permission::products_write()],
        )
    }

    fn new_product(tenant_id: TenantId, cost: i64) -> CreateProduct {
        CreateProduct {
            tenant_id,
            product_id: ProductId::new(AggregateId::new()),
            sku: "RICE-5".to_string(),
            name: "Rice 5kg".to_string(),
            cost: Decimal::from(cost),
            margins: ChannelMargins::default(),
            sale_taxes: vec![],
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn manager_sets_cost_and_margin() {
        let svc = service();
        let tenant_id = TenantId::new();
        let product = svc.create_product(&manager(tenant_id), tenant_id, new_product(tenant_id, 0)).unwrap();
        let product_id = product.id_typed();

        svc.set_cost(&manager(tenant_id), tenant_id, product_id, Decimal::from(75)).unwrap();
        let sheet = svc
            .set_margin(
                &manager(tenant_id),
                tenant_id,
                product_id,
                Channel::Wholesale,
                MarginPercent::new(Decimal::from(25)),
            )
            .unwrap();

        assert_eq!(sheet.get(Channel::Wholesale).net, Decimal::from(100));
        assert_eq!(svc.channel_prices(tenant_id, product_id).unwrap(), sheet);
    }

    #[test]
    fn clerk_cannot_touch_cost_or_margin() {
        let svc = service();
        let tenant_id = TenantId::new();
        let product = svc.create_product(&clerk(tenant_id), tenant_id, new_product(tenant_id, 0)).unwrap();

        let err = svc
            .set_cost(&clerk(tenant_id), tenant_id, product.id_typed(), Decimal::from(10))
            .unwrap_err();
        assert!(matches!(err, PricingServiceError::Unauthorized(AuthzError::MissingRole(_))));

        let err = svc
            .set_margin(
                &clerk(tenant_id),
                tenant_id,
                product.id_typed(),
                Channel::Tat,
                MarginPercent::new(Decimal::from(30)),
            )
            .unwrap_err();
        assert!(matches!(err, PricingServiceError::Unauthorized(AuthzError::MissingRole(_))));
    }

    #[test]
    fn clerk_cannot_seed_cost_at_creation() {
        let svc = service();
        let tenant_id = TenantId::new();
        let err = svc
            .create_product(&clerk(tenant_id), tenant_id, new_product(tenant_id, 12))
            .unwrap_err();
        assert!(matches!(err, PricingServiceError::Unauthorized(AuthzError::MissingRole(_))));
    }

    #[test]
    fn clerk_may_change_taxes() {
        let svc = service();
        let tenant_id = TenantId::new();
        let product = svc.create_product(&manager(tenant_id), tenant_id, new_product(tenant_id, 80)).unwrap();
        svc.set_margin(
            &manager(tenant_id),
            tenant_id,
            product.id_typed(),
            Channel::Tat,
            MarginPercent::new(Decimal::from(20)),
        )
        .unwrap();

        let sheet = svc
            .set_sale_taxes(
                &clerk(tenant_id),
                tenant_id,
                product.id_typed(),
                vec![SaleTax::percent("iva19", "IVA 19%", Decimal::from(19))],
            )
            .unwrap();
        assert_eq!(sheet.get(Channel::Tat).gross, Decimal::from(119));
    }

    #[test]
    fn other_tenant_principal_is_rejected() {
        let svc = service();
        let tenant_id = TenantId::new();
        let product = svc.create_product(&manager(tenant_id), tenant_id, new_product(tenant_id, 5)).unwrap();

        let err = svc
            .set_cost(&manager(TenantId::new()), tenant_id, product.id_typed(), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, PricingServiceError::Unauthorized(AuthzError::TenantMismatch)));
    }

    #[test]
    fn unknown_product_is_reported() {
        let svc = service();
        let tenant_id = TenantId::new();
        let missing = ProductId::new(AggregateId::new());

        let err = svc.set_cost(&manager(tenant_id), tenant_id, missing, Decimal::ONE).unwrap_err();
        assert!(matches!(err, PricingServiceError::ProductNotFound(id) if id == missing));
        assert!(svc.channel_prices(tenant_id, missing).is_err());
    }

    #[test]
    fn partner_gross_follows_fiscal_position() {
        let exporter = PartnerId::new();
        let mut positions = FiscalPositionResolver::new();
        positions.assign(exporter, FiscalPosition::new("Export").exempt(TaxId::new("iva19")));
        let products = Arc::new(ProductStore::new(InMemoryEventStore::new()));
        let svc = PricingService::new(products, PricingConfig::default()).with_tax_resolver(positions);

        let tenant_id = TenantId::new();
        let cmd = CreateProduct {
            margins: ChannelMargins::default().with(Channel::Tat, MarginPercent::new(Decimal::from(20))),
            sale_taxes: vec![SaleTax::percent("iva19", "IVA 19%", Decimal::from(19))],
            ..new_product(tenant_id, 80)
        };
        let product_id = svc.create_product(&manager(tenant_id), tenant_id, cmd).unwrap().id_typed();

        let exported = svc
            .channel_prices_for_partner(tenant_id, product_id, Some(exporter))
            .unwrap();
        assert_eq!(exported.get(Channel::Tat).net, Decimal::from(100));
        assert_eq!(exported.get(Channel::Tat).gross, Decimal::from(100));

        let local = svc
            .channel_prices_for_partner(tenant_id, product_id, Some(PartnerId::new()))
            .unwrap();
        assert_eq!(local.get(Channel::Tat).gross, Decimal::from(119));
        assert_eq!(
            svc.channel_prices_for_partner(tenant_id, product_id, None).unwrap(),
            svc.channel_prices(tenant_id, product_id).unwrap()
        );
    }

    #[test]
    fn rounded_prices_use_configured_scale() {
        let products = Arc::new(ProductStore::new(InMemoryEventStore::new()));
        let config = PricingConfig {
            price_scale: 1,
            ..PricingConfig::default()
        };
        let svc = PricingService::new(products, config);
        let tenant_id = TenantId::new();
        let product = svc.create_product(&manager(tenant_id), tenant_id, new_product(tenant_id, 10)).unwrap();
        svc.set_margin(
            &manager(tenant_id),
            tenant_id,
            product.id_typed(),
            Channel::Offer,
            MarginPercent::new(Decimal::from(70)),
        )
        .unwrap();

        // 10 / 0.3 = 33.333...
        let rounded = svc.channel_prices_rounded(tenant_id, product.id_typed()).unwrap();
        assert_eq!(rounded.get(Channel::Offer).net, Decimal::new(333, 1));
    }
}
