//! Purchase document lifecycle with cost propagation.
//!
//! Document commands run through the dispatcher like any aggregate; once the
//! events are committed the matching cost hook runs before the call returns,
//! so product prices are settled when the caller sees the result.
//!
//! The workflow is the only way to reach the hooks. There is no public
//! synchronizer to hand an uncommitted document to:
//!
//! ```compile_fail
//! use ecopricing_infra::sync::CostSynchronizer;
//! ```
//!
//! ```compile_fail
//! use ecopricing_infra::CostSynchronizer;
//! ```

use std::sync::Arc;

use thiserror::Error;

use ecopricing_auth::{AuthzError, Permission, Principal, authorize};
use ecopricing_core::{AggregateId, TenantId};
use ecopricing_invoicing::{VendorBill, VendorBillCommand, VendorBillEvent, VendorBillId};
use ecopricing_purchasing::{
    PurchaseOrder, PurchaseOrderCommand, PurchaseOrderEvent, PurchaseOrderId,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;
use crate::product_store::ProductStore;
use crate::sync::{CostSynchronizer, SyncReport};

pub const PURCHASE_ORDER_AGGREGATE_TYPE: &str = "purchasing.order";
pub const VENDOR_BILL_AGGREGATE_TYPE: &str = "invoicing.vendor_bill";

#[derive(Debug, Error)]
pub enum DocumentWorkflowError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Purchase order or vendor bill after a command, with the cost sync outcome.
#[derive(Debug, Clone)]
pub struct DocumentOutcome<D> {
    pub document: D,
    pub sync: SyncReport,
}

#[derive(Debug)]
pub struct DocumentWorkflow<S> {
    dispatcher: CommandDispatcher<S>,
    synchronizer: CostSynchronizer<S>,
}

impl<S> DocumentWorkflow<S>
where
    S: EventStore,
{
    /// `store` holds the document streams; costs are written to `products`.
    pub fn new(store: S, products: Arc<ProductStore<S>>) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store),
            synchronizer: CostSynchronizer::new(products),
        }
    }

    pub fn purchase_order(
        &self,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
    ) -> Result<Option<PurchaseOrder>, DocumentWorkflowError> {
        let order: PurchaseOrder =
            self.dispatcher
                .load(tenant_id, order_id.0, |_, id| PurchaseOrder::empty(PurchaseOrderId::new(id)))?;
        Ok(order.tenant_id().is_some().then_some(order))
    }

    pub fn vendor_bill(
        &self,
        tenant_id: TenantId,
        bill_id: VendorBillId,
    ) -> Result<Option<VendorBill>, DocumentWorkflowError> {
        let bill: VendorBill =
            self.dispatcher
                .load(tenant_id, bill_id.0, |_, id| VendorBill::empty(VendorBillId::new(id)))?;
        Ok(bill.tenant_id().is_some().then_some(bill))
    }

    /// Run `command` on the order as `principal`. Needs `purchases.write` in
    /// `tenant_id`; no pricing role is involved even when cost changes.
    pub fn execute_purchase_order(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        order_id: PurchaseOrderId,
        command: &PurchaseOrderCommand,
    ) -> Result<DocumentOutcome<PurchaseOrder>, DocumentWorkflowError> {
        check_purchase_right(principal, tenant_id, "execute_purchase_order")?;
        let actor = principal.principal_id;

        let out = self.dispatcher.dispatch(
            tenant_id,
            order_id.0,
            PURCHASE_ORDER_AGGREGATE_TYPE,
            command,
            |_: TenantId, id: AggregateId| PurchaseOrder::empty(PurchaseOrderId::new(id)),
        )?;

        let order = out.aggregate;
        let mut sync = SyncReport::default();
        let mut written = Vec::new();
        for event in &out.events {
            match event {
                PurchaseOrderEvent::PurchaseOrderConfirmed(_) => {
                    sync.merge(self.synchronizer.on_purchase_order_confirmed(actor, tenant_id, &order));
                }
                other => written.extend(other.written_line()),
            }
        }
        if !written.is_empty() {
            let report = self
                .synchronizer
                .on_purchase_order_lines_written(actor, tenant_id, &order, &written);
            sync.merge(report);
        }

        Ok(DocumentOutcome {
            document: order,
            sync,
        })
    }

    /// Run `command` on the bill as `principal`. Needs `purchases.write` in
    /// `tenant_id`; posting writes cost regardless of the principal's roles.
    pub fn execute_vendor_bill(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        bill_id: VendorBillId,
        command: &VendorBillCommand,
    ) -> Result<DocumentOutcome<VendorBill>, DocumentWorkflowError> {
        check_purchase_right(principal, tenant_id, "execute_vendor_bill")?;
        let actor = principal.principal_id;

        let out = self.dispatcher.dispatch(
            tenant_id,
            bill_id.0,
            VENDOR_BILL_AGGREGATE_TYPE,
            command,
            |_: TenantId, id: AggregateId| VendorBill::empty(VendorBillId::new(id)),
        )?;

        let bill = out.aggregate;
        let mut sync = SyncReport::default();
        for event in &out.events {
            let report = match event {
                VendorBillEvent::VendorBillPosted(_) => {
                    self.synchronizer.on_vendor_bill_posted(actor, tenant_id, &bill)
                }
                VendorBillEvent::VendorBillLinePriceAmended(e) => self
                    .synchronizer
                    .on_vendor_bill_line_amended(actor, tenant_id, &bill, e.line_no),
                _ => SyncReport::default(),
            };
            sync.merge(report);
        }

        Ok(DocumentOutcome {
            document: bill,
            sync,
        })
    }
}

fn check_purchase_right(
    principal: &Principal,
    tenant_id: TenantId,
    operation: &'static str,
) -> Result<(), DocumentWorkflowError> {
    authorize(principal, tenant_id, &Permission::purchases_write()).map_err(|err| {
        tracing::warn!(
            tenant_id = %tenant_id,
            principal_id = %principal.principal_id,
            operation,
            error = %err,
            "purchase document command rejected"
        );
        DocumentWorkflowError::Unauthorized(err)
    })
}
