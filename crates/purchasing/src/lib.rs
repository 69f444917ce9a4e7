//! Purchasing domain module (Purchase Orders, event-sourced).
//!
//! Order lines carry the tax-excluded unit price agreed with the supplier;
//! that price is what feeds product cost once the order is confirmed.

pub mod order;

pub use order::{
    AddLine, AmendLine, CancelPurchaseOrder, ConfirmPurchaseOrder, CreatePurchaseOrder,
    LineItem, LockPurchaseOrder, PurchaseOrder, PurchaseOrderCancelled, PurchaseOrderCommand,
    PurchaseOrderConfirmed, PurchaseOrderCreated, PurchaseOrderEvent, PurchaseOrderId,
    PurchaseOrderLineAdded, PurchaseOrderLineAmended, PurchaseOrderLocked, PurchaseOrderStatus,
};
