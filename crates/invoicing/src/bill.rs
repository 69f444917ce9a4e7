use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecopricing_core::{Aggregate, AggregateId, AggregateRoot, DomainError, PartnerId, TenantId};
use ecopricing_events::Event;
use ecopricing_products::ProductId;

/// Vendor bill identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorBillId(pub AggregateId);

impl VendorBillId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VendorBillId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Vendor bill status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorBillStatus {
    Draft,
    Posted,
    Cancelled,
}

/// Bill line. `product_id` is `None` for free-text lines (freight, notes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub line_no: u32,
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
    /// Tax-excluded price per unit.
    pub unit_price: Decimal,
}

impl BillLine {
    /// A line that can feed product cost: it names a product and carries a non-zero price.
    pub fn carries_cost(&self) -> bool {
        self.product_id.is_some() && !self.unit_price.is_zero()
    }
}

/// Aggregate root: VendorBill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorBill {
    id: VendorBillId,
    tenant_id: Option<TenantId>,
    vendor_id: Option<PartnerId>,
    status: VendorBillStatus,
    lines: Vec<BillLine>,
    version: u64,
    created: bool,
}

impl VendorBill {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: VendorBillId) -> Self {
        Self {
            id,
            tenant_id: None,
            vendor_id: None,
            status: VendorBillStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> VendorBillId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn vendor_id(&self) -> Option<PartnerId> {
        self.vendor_id
    }

    pub fn status(&self) -> VendorBillStatus {
        self.status
    }

    pub fn is_posted(&self) -> bool {
        self.status == VendorBillStatus::Posted
    }

    pub fn lines(&self) -> &[BillLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&BillLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }
}

impl AggregateRoot for VendorBill {
    type Id = VendorBillId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateVendorBill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVendorBill {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub vendor_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddBillLine (draft bills only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBillLine {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub product_id: Option<ProductId>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PostVendorBill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostVendorBill {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendBillLinePrice (posted bills only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendBillLinePrice {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub line_no: u32,
    pub unit_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelVendorBill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelVendorBill {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorBillCommand {
    CreateVendorBill(CreateVendorBill),
    AddLine(AddBillLine),
    Post(PostVendorBill),
    AmendLinePrice(AmendBillLinePrice),
    Cancel(CancelVendorBill),
}

/// Event: VendorBillCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBillCreated {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub vendor_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VendorBillLineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBillLineAdded {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub line: BillLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VendorBillPosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBillPosted {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VendorBillLinePriceAmended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBillLinePriceAmended {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub line_no: u32,
    pub previous_price: Decimal,
    pub unit_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VendorBillCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBillCancelled {
    pub tenant_id: TenantId,
    pub bill_id: VendorBillId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorBillEvent {
    VendorBillCreated(VendorBillCreated),
    VendorBillLineAdded(VendorBillLineAdded),
    VendorBillPosted(VendorBillPosted),
    VendorBillLinePriceAmended(VendorBillLinePriceAmended),
    VendorBillCancelled(VendorBillCancelled),
}

impl Event for VendorBillEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VendorBillEvent::VendorBillCreated(_) => "invoicing.vendor_bill.created",
            VendorBillEvent::VendorBillLineAdded(_) => "invoicing.vendor_bill.line_added",
            VendorBillEvent::VendorBillPosted(_) => "invoicing.vendor_bill.posted",
            VendorBillEvent::VendorBillLinePriceAmended(_) => {
                "invoicing.vendor_bill.line_price_amended"
            }
            VendorBillEvent::VendorBillCancelled(_) => "invoicing.vendor_bill.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            VendorBillEvent::VendorBillCreated(e) => e.occurred_at,
            VendorBillEvent::VendorBillLineAdded(e) => e.occurred_at,
            VendorBillEvent::VendorBillPosted(e) => e.occurred_at,
            VendorBillEvent::VendorBillLinePriceAmended(e) => e.occurred_at,
            VendorBillEvent::VendorBillCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for VendorBill {
    type Command = VendorBillCommand;
    type Event = VendorBillEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            VendorBillEvent::VendorBillCreated(e) => {
                self.id = e.bill_id;
                self.tenant_id = Some(e.tenant_id);
                self.vendor_id = Some(e.vendor_id);
                self.status = VendorBillStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            VendorBillEvent::VendorBillLineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            VendorBillEvent::VendorBillPosted(_) => {
                self.status = VendorBillStatus::Posted;
            }
            VendorBillEvent::VendorBillLinePriceAmended(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.unit_price = e.unit_price;
                }
            }
            VendorBillEvent::VendorBillCancelled(_) => {
                self.status = VendorBillStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            VendorBillCommand::CreateVendorBill(cmd) => self.handle_create(cmd),
            VendorBillCommand::AddLine(cmd) => self.handle_add_line(cmd),
            VendorBillCommand::Post(cmd) => self.handle_post(cmd),
            VendorBillCommand::AmendLinePrice(cmd) => self.handle_amend_line_price(cmd),
            VendorBillCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl VendorBill {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_bill_id(&self, bill_id: VendorBillId) -> Result<(), DomainError> {
        if self.id != bill_id {
            return Err(DomainError::invariant("bill_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateVendorBill) -> Result<Vec<VendorBillEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("vendor bill already exists"));
        }

        Ok(vec![VendorBillEvent::VendorBillCreated(VendorBillCreated {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            vendor_id: cmd.vendor_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddBillLine) -> Result<Vec<VendorBillEvent>, DomainError> {
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_bill_id(cmd.bill_id)?;

        if self.status != VendorBillStatus::Draft {
            return Err(DomainError::invariant("lines can only be added to draft bills"));
        }
        if cmd.quantity <= Decimal::ZERO {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unit price cannot be negative"));
        }

        let line_no = self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1;
        Ok(vec![VendorBillEvent::VendorBillLineAdded(VendorBillLineAdded {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            line: BillLine {
                line_no,
                product_id: cmd.product_id,
                quantity: cmd.quantity,
                unit_price: cmd.unit_price,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_post(&self, cmd: &PostVendorBill) -> Result<Vec<VendorBillEvent>, DomainError> {
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_bill_id(cmd.bill_id)?;

        if self.status != VendorBillStatus::Draft {
            return Err(DomainError::invariant("only draft bills can be posted"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot post a bill without lines"));
        }

        Ok(vec![VendorBillEvent::VendorBillPosted(VendorBillPosted {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend_line_price(
        &self,
        cmd: &AmendBillLinePrice,
    ) -> Result<Vec<VendorBillEvent>, DomainError> {
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_bill_id(cmd.bill_id)?;

        if self.status != VendorBillStatus::Posted {
            return Err(DomainError::invariant(
                "line prices can only be amended on posted bills",
            ));
        }
        if cmd.unit_price < Decimal::ZERO {
            return Err(DomainError::validation("unit price cannot be negative"));
        }

        let line = self
            .line(cmd.line_no)
            .ok_or_else(|| DomainError::validation(format!("unknown line {}", cmd.line_no)))?;
        if line.unit_price == cmd.unit_price {
            return Ok(vec![]);
        }

        Ok(vec![VendorBillEvent::VendorBillLinePriceAmended(
            VendorBillLinePriceAmended {
                tenant_id: cmd.tenant_id,
                bill_id: cmd.bill_id,
                line_no: cmd.line_no,
                previous_price: line.unit_price,
                unit_price: cmd.unit_price,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_cancel(&self, cmd: &CancelVendorBill) -> Result<Vec<VendorBillEvent>, DomainError> {
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_bill_id(cmd.bill_id)?;

        if self.status == VendorBillStatus::Cancelled {
            return Err(DomainError::conflict("vendor bill is already cancelled"));
        }

        Ok(vec![VendorBillEvent::VendorBillCancelled(VendorBillCancelled {
            tenant_id: cmd.tenant_id,
            bill_id: cmd.bill_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
