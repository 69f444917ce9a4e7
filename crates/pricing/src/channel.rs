use serde::{Deserialize, Serialize};

/// Sales channel with its own margin and derived price pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Tat,
    Wholesale,
    PointOfSale,
    Offer,
}

impl Channel {
    /// Every channel, in price-list classification order.
    pub const ALL: [Channel; 4] = [
        Channel::Tat,
        Channel::Wholesale,
        Channel::PointOfSale,
        Channel::Offer,
    ];

    /// Upper-case name fragments that bind a price list to this channel.
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Channel::Tat => &["T.A.T"],
            Channel::Wholesale => &["MAYORISTA"],
            Channel::PointOfSale => &["P.O.S", "POS"],
            Channel::Offer => &["OFERTA"],
        }
    }

    /// Bind a price-list name to a channel by case-insensitive substring match.
    ///
    /// Channels are tried in [`Channel::ALL`] order and the first hit wins.
    /// `None` means the list is uncontrolled.
    pub fn for_price_list(name: &str) -> Option<Channel> {
        let upper = name.to_uppercase();
        Channel::ALL
            .into_iter()
            .find(|channel| channel.markers().iter().any(|m| upper.contains(m)))
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Tat => "T.A.T",
            Channel::Wholesale => "Wholesale",
            Channel::PointOfSale => "P.O.S",
            Channel::Offer => "Offer",
        }
    }
}

impl core::fmt::Display for Channel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}
