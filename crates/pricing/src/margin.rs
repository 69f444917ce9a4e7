use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecopricing_core::ValueObject;

use crate::Channel;

/// Contribution margin as a percentage of the net sale price.
///
/// Any value is representable; only `(0, 100)` can price. Zero means "not
/// defined" and values at or above 100 would need a non-positive denominator.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarginPercent(Decimal);

impl ValueObject for MarginPercent {}

impl MarginPercent {
    pub const ZERO: MarginPercent = MarginPercent(Decimal::ZERO);

    pub fn new(percent: Decimal) -> Self {
        Self(percent)
    }

    pub fn percent(self) -> Decimal {
        self.0
    }

    /// Fraction of the net price kept as margin (`25%` is `0.25`).
    pub fn fraction(self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }

    pub fn is_defined(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Whether this margin yields a finite positive price.
    pub fn is_priceable(self) -> bool {
        self.is_defined() && self.0 < Decimal::ONE_HUNDRED
    }
}

impl From<Decimal> for MarginPercent {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for MarginPercent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// One margin per channel.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMargins {
    pub tat: MarginPercent,
    pub wholesale: MarginPercent,
    pub point_of_sale: MarginPercent,
    pub offer: MarginPercent,
}

impl ValueObject for ChannelMargins {}

impl ChannelMargins {
    pub fn get(&self, channel: Channel) -> MarginPercent {
        match channel {
            Channel::Tat => self.tat,
            Channel::Wholesale => self.wholesale,
            Channel::PointOfSale => self.point_of_sale,
            Channel::Offer => self.offer,
        }
    }

    pub fn set(&mut self, channel: Channel, margin: MarginPercent) {
        let slot = match channel {
            Channel::Tat => &mut self.tat,
            Channel::Wholesale => &mut self.wholesale,
            Channel::PointOfSale => &mut self.point_of_sale,
            Channel::Offer => &mut self.offer,
        };
        *slot = margin;
    }

    pub fn with(mut self, channel: Channel, margin: MarginPercent) -> Self {
        self.set(channel, margin);
        self
    }
}
