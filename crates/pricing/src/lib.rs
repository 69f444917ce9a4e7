//! Channel pricing rules (pure, deterministic).
//!
//! Net price per sales channel is derived from cost and a contribution margin:
//! `net = cost / (1 - margin / 100)`, and gross adds the summed percentage sale
//! taxes: `gross = net * (1 + rate)`. Degenerate inputs price at zero instead of
//! failing.

pub mod channel;
pub mod margin;
pub mod recalculator;
pub mod tax;

pub use channel::Channel;
pub use margin::{ChannelMargins, MarginPercent};
pub use recalculator::{ChannelPrice, ChannelPriceSheet, gross_price, net_price, round_price};
pub use tax::{
    FiscalPosition, FiscalPositionResolver, ProductTaxResolver, SaleTax, TaxAmountType, TaxId,
    TaxRate, TaxResolver, TaxScope,
};

pub use rust_decimal::Decimal;
