//! Price recalculation from cost, channel margins and sale tax rate.
//!
//! Total functions: any degenerate input (no cost, undefined margin, margin at
//! or above 100, arithmetic overflow) yields zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use ecopricing_core::ValueObject;

use crate::{Channel, ChannelMargins, MarginPercent, TaxRate};

/// Tax-excluded price that keeps `margin` of the sale price over `cost`.
pub fn net_price(cost: Decimal, margin: MarginPercent) -> Decimal {
    if cost <= Decimal::ZERO || !margin.is_priceable() {
        return Decimal::ZERO;
    }
    let denominator = Decimal::ONE - margin.fraction();
    cost.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// `net` with `rate` applied on top.
pub fn gross_price(net: Decimal, rate: TaxRate) -> Decimal {
    (Decimal::ONE + rate.fraction())
        .checked_mul(net)
        .unwrap_or(Decimal::ZERO)
}

/// Round for presentation, half away from zero.
pub fn round_price(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Net/gross pair for one channel.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPrice {
    pub net: Decimal,
    pub gross: Decimal,
}

impl ValueObject for ChannelPrice {}

impl ChannelPrice {
    pub fn compute(cost: Decimal, margin: MarginPercent, rate: TaxRate) -> Self {
        let net = net_price(cost, margin);
        Self {
            net,
            gross: gross_price(net, rate),
        }
    }

    pub fn rounded(self, scale: u32) -> Self {
        Self {
            net: round_price(self.net, scale),
            gross: round_price(self.gross, scale),
        }
    }
}

/// Derived prices for all channels.
///
/// Only [`ChannelPriceSheet::compute`] builds a non-zero sheet, so the values
/// are always a function of the inputs they were computed from.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPriceSheet {
    tat: ChannelPrice,
    wholesale: ChannelPrice,
    point_of_sale: ChannelPrice,
    offer: ChannelPrice,
}

impl ValueObject for ChannelPriceSheet {}

impl ChannelPriceSheet {
    pub fn compute(cost: Decimal, margins: &ChannelMargins, rate: TaxRate) -> Self {
        let price = |channel| ChannelPrice::compute(cost, margins.get(channel), rate);
        Self {
            tat: price(Channel::Tat),
            wholesale: price(Channel::Wholesale),
            point_of_sale: price(Channel::PointOfSale),
            offer: price(Channel::Offer),
        }
    }

    pub fn get(&self, channel: Channel) -> ChannelPrice {
        match channel {
            Channel::Tat => self.tat,
            Channel::Wholesale => self.wholesale,
            Channel::PointOfSale => self.point_of_sale,
            Channel::Offer => self.offer,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, ChannelPrice)> + '_ {
        Channel::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Same net prices, gross recomputed under `rate` (e.g. a partner's
    /// fiscal position).
    pub fn with_tax_rate(&self, rate: TaxRate) -> Self {
        let regross = |p: ChannelPrice| ChannelPrice {
            net: p.net,
            gross: gross_price(p.net, rate),
        };
        Self {
            tat: regross(self.tat),
            wholesale: regross(self.wholesale),
            point_of_sale: regross(self.point_of_sale),
            offer: regross(self.offer),
        }
    }

    pub fn rounded(&self, scale: u32) -> Self {
        Self {
            tat: self.tat.rounded(scale),
            wholesale: self.wholesale.rounded(scale),
            point_of_sale: self.point_of_sale.rounded(scale),
            offer: self.offer.rounded(scale),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.iter()
            .all(|(_, p)| p.net.is_zero() && p.gross.is_zero())
    }
}
