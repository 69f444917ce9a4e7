use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecopricing_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use ecopricing_events::Event;
use ecopricing_pricing::{
    Channel, ChannelMargins, ChannelPriceSheet, MarginPercent, ProductTaxResolver, SaleTax, TaxRate,
    TaxResolver,
};

/// Product identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Where a cost write came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostOrigin {
    /// Posted vendor bill line (or an amendment of one).
    VendorBill { bill_id: AggregateId, line_no: u32 },
    /// Purchase order line on a confirmed order.
    PurchaseOrder { order_id: AggregateId, line_no: u32 },
    /// Direct edit by a principal holding pricing authority.
    Manual,
}

impl CostOrigin {
    pub fn is_document(&self) -> bool {
        !matches!(self, CostOrigin::Manual)
    }
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    tenant_id: Option<TenantId>,
    sku: String,
    name: String,
    cost: Decimal,
    margins: ChannelMargins,
    sale_taxes: Vec<SaleTax>,
    prices: ChannelPriceSheet,
    last_cost_origin: Option<CostOrigin>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            tenant_id: None,
            sku: String::new(),
            name: String::new(),
            cost: Decimal::ZERO,
            margins: ChannelMargins::default(),
            sale_taxes: Vec::new(),
            prices: ChannelPriceSheet::default(),
            last_cost_origin: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tax-excluded acquisition cost.
    pub fn cost(&self) -> Decimal {
        self.cost
    }

    pub fn margins(&self) -> &ChannelMargins {
        &self.margins
    }

    pub fn margin(&self, channel: Channel) -> MarginPercent {
        self.margins.get(channel)
    }

    pub fn sale_taxes(&self) -> &[SaleTax] {
        &self.sale_taxes
    }

    /// Rate of the product's own sale taxes, before any partner remapping.
    pub fn tax_rate(&self) -> TaxRate {
        ProductTaxResolver.resolve(&self.sale_taxes, None)
    }

    /// Derived per-channel prices as of the last applied event.
    pub fn prices(&self) -> &ChannelPriceSheet {
        &self.prices
    }

    pub fn last_cost_origin(&self) -> Option<&CostOrigin> {
        self.last_cost_origin.as_ref()
    }

    fn recompute_prices(&mut self) {
        self.prices = ChannelPriceSheet::compute(self.cost, &self.margins, self.tax_rate());
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub cost: Decimal,
    pub margins: ChannelMargins,
    pub sale_taxes: Vec<SaleTax>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCost.
///
/// Authorization is not checked here; the caller decides which entry point
/// (document sync or gated manual edit) may issue it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCost {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub cost: Decimal,
    pub origin: CostOrigin,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetMargin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMargin {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub channel: Channel,
    pub margin: MarginPercent,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetSaleTaxes (replaces the whole tax set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSaleTaxes {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sale_taxes: Vec<SaleTax>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    UpdateCost(UpdateCost),
    SetMargin(SetMargin),
    SetSaleTaxes(SetSaleTaxes),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub cost: Decimal,
    pub margins: ChannelMargins,
    pub sale_taxes: Vec<SaleTax>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CostUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostUpdated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub previous: Decimal,
    pub cost: Decimal,
    pub origin: CostOrigin,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MarginChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginChanged {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub channel: Channel,
    pub previous: MarginPercent,
    pub margin: MarginPercent,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleTaxesChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTaxesChanged {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub sale_taxes: Vec<SaleTax>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    CostUpdated(CostUpdated),
    MarginChanged(MarginChanged),
    SaleTaxesChanged(SaleTaxesChanged),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::CostUpdated(_) => "products.product.cost_updated",
            ProductEvent::MarginChanged(_) => "products.product.margin_changed",
            ProductEvent::SaleTaxesChanged(_) => "products.product.sale_taxes_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::CostUpdated(e) => e.occurred_at,
            ProductEvent::MarginChanged(e) => e.occurred_at,
            ProductEvent::SaleTaxesChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.tenant_id = Some(e.tenant_id);
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.cost = e.cost;
                self.margins = e.margins;
                self.sale_taxes = e.sale_taxes.clone();
                self.created = true;
            }
            ProductEvent::CostUpdated(e) => {
                self.cost = e.cost;
                self.last_cost_origin = Some(e.origin.clone());
            }
            ProductEvent::MarginChanged(e) => {
                self.margins.set(e.channel, e.margin);
            }
            ProductEvent::SaleTaxesChanged(e) => {
                self.sale_taxes = e.sale_taxes.clone();
            }
        }

        // Every event touches cost, a margin or the tax set.
        self.recompute_prices();
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::UpdateCost(cmd) => self.handle_update_cost(cmd),
            ProductCommand::SetMargin(cmd) => self.handle_set_margin(cmd),
            ProductCommand::SetSaleTaxes(cmd) => self.handle_set_sale_taxes(cmd),
        }
    }
}

impl Product {
    fn ensure_target(&self, tenant_id: TenantId, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            sku: cmd.sku.clone(),
            name: cmd.name.clone(),
            cost: cmd.cost,
            margins: cmd.margins,
            sale_taxes: cmd.sale_taxes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_cost(&self, cmd: &UpdateCost) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.product_id)?;

        // Re-applying the same cost is a no-op.
        if cmd.cost == self.cost {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::CostUpdated(CostUpdated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            previous: self.cost,
            cost: cmd.cost,
            origin: cmd.origin.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_margin(&self, cmd: &SetMargin) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.product_id)?;

        let previous = self.margins.get(cmd.channel);
        if previous == cmd.margin {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::MarginChanged(MarginChanged {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            channel: cmd.channel,
            previous,
            margin: cmd.margin,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_sale_taxes(&self, cmd: &SetSaleTaxes) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.product_id)?;

        if cmd.sale_taxes == self.sale_taxes {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::SaleTaxesChanged(SaleTaxesChanged {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            sale_taxes: cmd.sale_taxes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
