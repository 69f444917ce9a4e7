use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecopricing_core::{Aggregate, AggregateId, AggregateRoot, DomainError, PartnerId, TenantId};
use ecopricing_events::Event;
use ecopricing_products::ProductId;

/// Purchase order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseOrderId(pub AggregateId);

impl PurchaseOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    /// Request for quotation, not yet committed.
    Draft,
    /// Confirmed with the supplier.
    Purchase,
    /// Locked; no further changes expected.
    Done,
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Confirmed or locked orders are binding purchases.
    pub fn is_confirmed(self) -> bool {
        matches!(self, PurchaseOrderStatus::Purchase | PurchaseOrderStatus::Done)
    }
}

/// Purchase order line. Section and note lines have no product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub line_no: u32,
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
    /// Tax-excluded price per unit.
    pub unit_price: Decimal,
}

/// Aggregate root: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    tenant_id: Option<TenantId>,
    supplier_id: Option<PartnerId>,
    status: PurchaseOrderStatus,
    lines: Vec<LineItem>,
    version: u64,
    created: bool,
}

impl PurchaseOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            supplier_id: None,
            status: PurchaseOrderStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn supplier_id(&self) -> Option<PartnerId> {
        self.supplier_id
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }
}

impl AggregateRoot for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine (draft or confirmed orders).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendLine. `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendLine {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmPurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LockPurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelPurchaseOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelPurchaseOrder {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderCommand {
    CreatePurchaseOrder(CreatePurchaseOrder),
    AddLine(AddLine),
    AmendLine(AmendLine),
    Confirm(ConfirmPurchaseOrder),
    Lock(LockPurchaseOrder),
    Cancel(CancelPurchaseOrder),
}

/// Event: PurchaseOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub supplier_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineAdded {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLineAmended (carries the line as amended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLineAmended {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub line: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderConfirmed {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderLocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLocked {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseOrderCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderCancelled {
    pub tenant_id: TenantId,
    pub order_id: PurchaseOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseOrderEvent {
    PurchaseOrderCreated(PurchaseOrderCreated),
    PurchaseOrderLineAdded(PurchaseOrderLineAdded),
    PurchaseOrderLineAmended(PurchaseOrderLineAmended),
    PurchaseOrderConfirmed(PurchaseOrderConfirmed),
    PurchaseOrderLocked(PurchaseOrderLocked),
    PurchaseOrderCancelled(PurchaseOrderCancelled),
}

impl PurchaseOrderEvent {
    /// Line number touched by a line-level event.
    pub fn written_line(&self) -> Option<u32> {
        match self {
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => Some(e.line.line_no),
            PurchaseOrderEvent::PurchaseOrderLineAmended(e) => Some(e.line.line_no),
            _ => None,
        }
    }
}

impl Event for PurchaseOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(_) => "purchasing.order.created",
            PurchaseOrderEvent::PurchaseOrderLineAdded(_) => "purchasing.order.line_added",
            PurchaseOrderEvent::PurchaseOrderLineAmended(_) => "purchasing.order.line_amended",
            PurchaseOrderEvent::PurchaseOrderConfirmed(_) => "purchasing.order.confirmed",
            PurchaseOrderEvent::PurchaseOrderLocked(_) => "purchasing.order.locked",
            PurchaseOrderEvent::PurchaseOrderCancelled(_) => "purchasing.order.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLineAmended(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderConfirmed(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderLocked(e) => e.occurred_at,
            PurchaseOrderEvent::PurchaseOrderCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for PurchaseOrder {
    type Command = PurchaseOrderCommand;
    type Event = PurchaseOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseOrderEvent::PurchaseOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.supplier_id = Some(e.supplier_id);
                self.status = PurchaseOrderStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            PurchaseOrderEvent::PurchaseOrderLineAmended(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line.line_no) {
                    *line = e.line.clone();
                }
            }
            PurchaseOrderEvent::PurchaseOrderConfirmed(_) => {
                self.status = PurchaseOrderStatus::Purchase;
            }
            PurchaseOrderEvent::PurchaseOrderLocked(_) => {
                self.status = PurchaseOrderStatus::Done;
            }
            PurchaseOrderEvent::PurchaseOrderCancelled(_) => {
                self.status = PurchaseOrderStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseOrderCommand::CreatePurchaseOrder(cmd) => self.handle_create(cmd),
            PurchaseOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            PurchaseOrderCommand::AmendLine(cmd) => self.handle_amend_line(cmd),
            PurchaseOrderCommand::Confirm(cmd) => self.handle_confirm(cmd),
            PurchaseOrderCommand::Lock(cmd) => self.handle_lock(cmd),
            PurchaseOrderCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl PurchaseOrder {
    fn ensure_target(&self, tenant_id: TenantId, order_id: PurchaseOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        match self.status {
            PurchaseOrderStatus::Draft | PurchaseOrderStatus::Purchase => Ok(()),
            PurchaseOrderStatus::Done => Err(DomainError::invariant("purchase order is locked")),
            PurchaseOrderStatus::Cancelled => {
                Err(DomainError::invariant("purchase order is cancelled"))
            }
        }
    }

    fn validate_amounts(quantity: Decimal, unit_price: Decimal) -> Result<(), DomainError> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unit price cannot be negative"));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreatePurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase order already exists"));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderCreated(PurchaseOrderCreated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            supplier_id: cmd.supplier_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;
        self.ensure_editable()?;
        Self::validate_amounts(cmd.quantity, cmd.unit_price)?;

        let line_no = self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1;
        Ok(vec![PurchaseOrderEvent::PurchaseOrderLineAdded(PurchaseOrderLineAdded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line: LineItem {
                line_no,
                product_id: cmd.product_id,
                quantity: cmd.quantity,
                unit_price: cmd.unit_price,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend_line(&self, cmd: &AmendLine) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;
        self.ensure_editable()?;

        let current = self
            .line(cmd.line_no)
            .ok_or_else(|| DomainError::validation(format!("unknown line {}", cmd.line_no)))?;

        let amended = LineItem {
            quantity: cmd.quantity.unwrap_or(current.quantity),
            unit_price: cmd.unit_price.unwrap_or(current.unit_price),
            ..current.clone()
        };
        Self::validate_amounts(amended.quantity, amended.unit_price)?;

        if &amended == current {
            return Ok(vec![]);
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderLineAmended(PurchaseOrderLineAmended {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line: amended,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(
        &self,
        cmd: &ConfirmPurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;

        if self.status != PurchaseOrderStatus::Draft {
            return Err(DomainError::invariant(
                "only draft purchase orders can be confirmed",
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot confirm purchase order without lines",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderConfirmed(PurchaseOrderConfirmed {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_lock(&self, cmd: &LockPurchaseOrder) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;

        if self.status != PurchaseOrderStatus::Purchase {
            return Err(DomainError::invariant(
                "only confirmed purchase orders can be locked",
            ));
        }

        Ok(vec![PurchaseOrderEvent::PurchaseOrderLocked(PurchaseOrderLocked {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(
        &self,
        cmd: &CancelPurchaseOrder,
    ) -> Result<Vec<PurchaseOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;

        match self.status {
            PurchaseOrderStatus::Cancelled => {
                Err(DomainError::conflict("purchase order is already cancelled"))
            }
            PurchaseOrderStatus::Done => {
                Err(DomainError::invariant("locked purchase orders cannot be cancelled"))
            }
            _ => Ok(vec![PurchaseOrderEvent::PurchaseOrderCancelled(PurchaseOrderCancelled {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            })]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecopricing_events::execute;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_order_id() -> PurchaseOrderId {
        PurchaseOrderId::new(AggregateId::new())
    }

    fn test_product_id() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_order(tenant_id: TenantId, order_id: PurchaseOrderId) -> PurchaseOrder {
        let mut order = PurchaseOrder::empty(order_id);
        let cmd = CreatePurchaseOrder {
            tenant_id,
            order_id,
            supplier_id: PartnerId::new(),
            occurred_at: test_time(),
        };
        execute(&mut order, &PurchaseOrderCommand::CreatePurchaseOrder(cmd)).unwrap();
        order
    }

    fn add_line(tenant_id: TenantId, order_id: PurchaseOrderId, price: i64) -> PurchaseOrderCommand {
        PurchaseOrderCommand::AddLine(AddLine {
            tenant_id,
            order_id,
            product_id: Some(test_product_id()),
            quantity: Decimal::from(10),
            unit_price: Decimal::from(price),
            occurred_at: test_time(),
        })
    }

    fn confirm(tenant_id: TenantId, order_id: PurchaseOrderId) -> PurchaseOrderCommand {
        PurchaseOrderCommand::Confirm(ConfirmPurchaseOrder {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn add_line_assigns_sequential_line_numbers() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = created_order(tenant_id, order_id);

        execute(&mut order, &add_line(tenant_id, order_id, 50)).unwrap();
        let events = execute(&mut order, &add_line(tenant_id, order_id, 60)).unwrap();

        assert_eq!(events[0].written_line(), Some(2));
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.line(2).unwrap().unit_price, Decimal::from(60));
    }

    #[test]
    fn confirm_requires_lines() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = created_order(tenant_id, order_id);

        let err = order.handle(&confirm(tenant_id, order_id)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn confirm_moves_draft_to_purchase() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = created_order(tenant_id, order_id);
        execute(&mut order, &add_line(tenant_id, order_id, 50)).unwrap();

        execute(&mut order, &confirm(tenant_id, order_id)).unwrap();
        assert_eq!(order.status(), PurchaseOrderStatus::Purchase);
        assert!(order.status().is_confirmed());

        let err = order.handle(&confirm(tenant_id, order_id)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn confirmed_orders_accept_new_and_amended_lines() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = created_order(tenant_id, order_id);
        execute(&mut order, &add_line(tenant_id, order_id, 50)).unwrap();
        execute(&mut order, &confirm(tenant_id, order_id)).unwrap();

        execute(&mut order, &add_line(tenant_id, order_id, 70)).unwrap();
        let amend = PurchaseOrderCommand::AmendLine(AmendLine {
            tenant_id,
            order_id,
            line_no: 1,
            quantity: None,
            unit_price: Some(Decimal::from(55)),
            occurred_at: test_time(),
        });
        let events = execute(&mut order, &amend).unwrap();

        assert_eq!(events[0].written_line(), Some(1));
        assert_eq!(order.line(1).unwrap().unit_price, Decimal::from(55));
        assert_eq!(order.line(1).unwrap().quantity, Decimal::from(10));
    }

    #[test]
    fn amend_with_same_values_is_a_no_op() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = created_order(tenant_id, order_id);
        execute(&mut order, &add_line(tenant_id, order_id, 50)).unwrap();

        let amend = PurchaseOrderCommand::AmendLine(AmendLine {
            tenant_id,
            order_id,
            line_no: 1,
            quantity: Some(Decimal::from(10)),
            unit_price: Some(Decimal::from(50)),
            occurred_at: test_time(),
        });
        assert!(order.handle(&amend).unwrap().is_empty());
    }

    #[test]
    fn amend_unknown_line_is_rejected() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = created_order(tenant_id, order_id);

        let amend = PurchaseOrderCommand::AmendLine(AmendLine {
            tenant_id,
            order_id,
            line_no: 9,
            quantity: None,
            unit_price: Some(Decimal::ONE),
            occurred_at: test_time(),
        });
        assert!(matches!(order.handle(&amend), Err(DomainError::Validation(_))));
    }

    #[test]
    fn locked_orders_reject_line_changes() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = created_order(tenant_id, order_id);
        execute(&mut order, &add_line(tenant_id, order_id, 50)).unwrap();
        execute(&mut order, &confirm(tenant_id, order_id)).unwrap();
        execute(
            &mut order,
            &PurchaseOrderCommand::Lock(LockPurchaseOrder {
                tenant_id,
                order_id,
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(order.status(), PurchaseOrderStatus::Done);
        assert!(order.status().is_confirmed());
        let err = order.handle(&add_line(tenant_id, order_id, 1)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn cancelled_orders_are_not_confirmed() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let mut order = created_order(tenant_id, order_id);
        let cancel = PurchaseOrderCommand::Cancel(CancelPurchaseOrder {
            tenant_id,
            order_id,
            occurred_at: test_time(),
        });
        execute(&mut order, &cancel).unwrap();

        assert!(!order.status().is_confirmed());
        assert!(matches!(order.handle(&cancel), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn negative_price_and_zero_quantity_are_rejected() {
        let tenant_id = test_tenant_id();
        let order_id = test_order_id();
        let order = created_order(tenant_id, order_id);

        let negative = PurchaseOrderCommand::AddLine(AddLine {
            tenant_id,
            order_id,
            product_id: None,
            quantity: Decimal::ONE,
            unit_price: Decimal::from(-1),
            occurred_at: test_time(),
        });
        assert!(matches!(order.handle(&negative), Err(DomainError::Validation(_))));

        let zero_qty = PurchaseOrderCommand::AddLine(AddLine {
            tenant_id,
            order_id,
            product_id: None,
            quantity: Decimal::ZERO,
            unit_price: Decimal::ONE,
            occurred_at: test_time(),
        });
        assert!(matches!(order.handle(&zero_qty), Err(DomainError::Validation(_))));
    }

    #[test]
    fn wrong_tenant_is_rejected() {
        let order_id = test_order_id();
        let order = created_order(test_tenant_id(), order_id);
        let err = order.handle(&add_line(test_tenant_id(), order_id, 5)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: line numbers stay unique and the last amendment wins.
            #[test]
            fn amendments_keep_last_price(
                prices in proptest::collection::vec(0i64..100_000, 1..20)
            ) {
                let tenant_id = test_tenant_id();
                let order_id = test_order_id();
                let mut order = created_order(tenant_id, order_id);
                execute(&mut order, &add_line(tenant_id, order_id, 1)).unwrap();

                for cents in &prices {
                    let amend = PurchaseOrderCommand::AmendLine(AmendLine {
                        tenant_id,
                        order_id,
                        line_no: 1,
                        quantity: None,
                        unit_price: Some(Decimal::new(*cents, 2)),
                        occurred_at: Utc::now(),
                    });
                    execute(&mut order, &amend).unwrap();
                }

                let last = *prices.last().unwrap();
                prop_assert_eq!(order.lines().len(), 1);
                prop_assert_eq!(order.line(1).unwrap().unit_price, Decimal::new(last, 2));
            }
        }
    }
}
