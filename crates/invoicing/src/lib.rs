//! Supplier invoicing (vendor bills, event-sourced).

pub mod bill;

pub use bill::{
    AddBillLine, AmendBillLinePrice, BillLine, CancelVendorBill, CreateVendorBill, PostVendorBill,
    VendorBill, VendorBillCancelled, VendorBillCommand, VendorBillCreated, VendorBillEvent,
    VendorBillId, VendorBillLineAdded, VendorBillLinePriceAmended, VendorBillPosted,
    VendorBillStatus,
};
