//! Cost propagation from purchase documents.
//!
//! Each hook corresponds to one document transition. Lines are applied one by
//! one: a line whose product is gone is logged and skipped, and the lines
//! already written stay written.

use std::sync::Arc;

use rust_decimal::Decimal;

use ecopricing_auth::PrincipalId;
use ecopricing_core::TenantId;
use ecopricing_invoicing::{BillLine, VendorBill};
use ecopricing_products::{CostOrigin, ProductId};
use ecopricing_purchasing::{LineItem, PurchaseOrder};

use crate::command_dispatcher::DispatchError;
use crate::event_store::EventStore;
use crate::product_store::ProductStore;

/// Per-hook outcome counts.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Lines that changed a product's cost.
    pub applied: usize,
    /// Lines whose price already matched the product's cost.
    pub unchanged: usize,
    /// Lines that could not be applied (missing product or failed write).
    pub skipped: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.unchanged == 0 && self.skipped == 0
    }

    pub(crate) fn merge(&mut self, other: SyncReport) {
        self.applied += other.applied;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
    }
}

/// Writes product cost from vendor bills and confirmed purchase orders.
///
/// Writes go through [`ProductStore::sync_cost`] and are not subject to the
/// pricing-role check: the documents are the authority. Only
/// [`crate::DocumentWorkflow`] holds one, and it calls the hooks with
/// documents it has just committed.
#[derive(Debug)]
pub(crate) struct CostSynchronizer<S> {
    products: Arc<ProductStore<S>>,
}

impl<S> CostSynchronizer<S>
where
    S: EventStore,
{
    pub(crate) fn new(products: Arc<ProductStore<S>>) -> Self {
        Self { products }
    }

    /// Bill moved to posted: every line with a product and a non-zero price.
    pub(crate) fn on_vendor_bill_posted(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        bill: &VendorBill,
    ) -> SyncReport {
        if !bill.is_posted() {
            tracing::warn!(tenant_id = %tenant_id, bill_id = %bill.id_typed(), "vendor bill is not posted; cost left untouched");
            return SyncReport::default();
        }

        let mut report = SyncReport::default();
        for line in bill.lines().iter().filter(|l| l.carries_cost()) {
            report.merge(self.apply_bill_line(actor, tenant_id, bill, line));
        }
        report
    }

    /// Price of a line on a posted bill was amended.
    pub(crate) fn on_vendor_bill_line_amended(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        bill: &VendorBill,
        line_no: u32,
    ) -> SyncReport {
        if !bill.is_posted() {
            return SyncReport::default();
        }

        match bill.line(line_no) {
            Some(line) if line.carries_cost() => self.apply_bill_line(actor, tenant_id, bill, line),
            _ => SyncReport::default(),
        }
    }

    /// Lines created or amended on a purchase order. Only confirmed or locked
    /// orders feed cost; draft and cancelled orders are ignored.
    pub(crate) fn on_purchase_order_lines_written(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        order: &PurchaseOrder,
        line_nos: &[u32],
    ) -> SyncReport {
        if !order.status().is_confirmed() {
            tracing::debug!(
                tenant_id = %tenant_id,
                order_id = %order.id_typed(),
                status = ?order.status(),
                "purchase order not confirmed; line cost not propagated"
            );
            return SyncReport::default();
        }

        let mut report = SyncReport::default();
        for line in line_nos.iter().filter_map(|no| order.line(*no)) {
            if line.product_id.is_some() {
                report.merge(self.apply_order_line(actor, tenant_id, order, line));
            }
        }
        report
    }

    /// Order confirmed: every line with a product.
    pub(crate) fn on_purchase_order_confirmed(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        order: &PurchaseOrder,
    ) -> SyncReport {
        if !order.status().is_confirmed() {
            return SyncReport::default();
        }

        let mut report = SyncReport::default();
        for line in order.lines().iter().filter(|l| l.product_id.is_some()) {
            report.merge(self.apply_order_line(actor, tenant_id, order, line));
        }
        report
    }

    fn apply_bill_line(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        bill: &VendorBill,
        line: &BillLine,
    ) -> SyncReport {
        let origin = CostOrigin::VendorBill {
            bill_id: bill.id_typed().0,
            line_no: line.line_no,
        };
        self.apply(actor, tenant_id, line.product_id, line.unit_price, origin)
    }

    fn apply_order_line(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        order: &PurchaseOrder,
        line: &LineItem,
    ) -> SyncReport {
        let origin = CostOrigin::PurchaseOrder {
            order_id: order.id_typed().0,
            line_no: line.line_no,
        };
        self.apply(actor, tenant_id, line.product_id, line.unit_price, origin)
    }

    fn apply(
        &self,
        actor: PrincipalId,
        tenant_id: TenantId,
        product_id: Option<ProductId>,
        cost: Decimal,
        origin: CostOrigin,
    ) -> SyncReport {
        let Some(product_id) = product_id else {
            return SyncReport::default();
        };

        match self.products.sync_cost(actor, tenant_id, product_id, cost, origin.clone()) {
            Ok(Some(_)) => SyncReport {
                applied: 1,
                ..SyncReport::default()
            },
            Ok(None) => SyncReport {
                unchanged: 1,
                ..SyncReport::default()
            },
            Err(DispatchError::NotFound) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    product_id = %product_id,
                    origin = ?origin,
                    "document line references an unknown product; skipped"
                );
                SyncReport {
                    skipped: 1,
                    ..SyncReport::default()
                }
            }
            Err(err) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    product_id = %product_id,
                    origin = ?origin,
                    error = %err,
                    "cost write failed; line skipped"
                );
                SyncReport {
                    skipped: 1,
                    ..SyncReport::default()
                }
            }
        }
    }
}
