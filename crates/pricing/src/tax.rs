use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecopricing_core::{PartnerId, ValueObject};

/// Tax code (e.g. "IVA19").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxId(String);

impl TaxId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxAmountType {
    /// `amount` is a percentage of the base.
    Percent,
    /// `amount` is a fixed sum per unit; never part of the rate.
    Fixed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxScope {
    Sale,
    Purchase,
}

/// A tax configured on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTax {
    pub id: TaxId,
    pub name: String,
    pub amount_type: TaxAmountType,
    pub scope: TaxScope,
    pub amount: Decimal,
}

impl SaleTax {
    /// Percentage sale tax, the only kind that contributes to [`TaxRate`].
    pub fn percent(id: impl Into<String>, name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: TaxId::new(id),
            name: name.into(),
            amount_type: TaxAmountType::Percent,
            scope: TaxScope::Sale,
            amount,
        }
    }

    pub fn counts_toward_rate(&self) -> bool {
        self.amount_type == TaxAmountType::Percent && self.scope == TaxScope::Sale
    }
}

/// Combined sale tax rate as a fraction (`19%` is `0.19`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl ValueObject for TaxRate {}

impl TaxRate {
    pub const ZERO: TaxRate = TaxRate(Decimal::ZERO);

    pub fn from_fraction(fraction: Decimal) -> Self {
        Self(fraction)
    }

    pub fn from_percent(percent: Decimal) -> Self {
        Self(percent / Decimal::ONE_HUNDRED)
    }

    /// Sum of the percentage sale taxes in `taxes`; zero when none apply.
    pub fn from_taxes<'a>(taxes: impl IntoIterator<Item = &'a SaleTax>) -> Self {
        let percent: Decimal = taxes
            .into_iter()
            .filter(|t| t.counts_toward_rate())
            .map(|t| t.amount)
            .sum();
        Self::from_percent(percent)
    }

    pub fn fraction(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

/// Resolves the sale tax rate applicable to a product for an optional partner.
pub trait TaxResolver: core::fmt::Debug + Send + Sync {
    fn resolve(&self, product_taxes: &[SaleTax], partner: Option<PartnerId>) -> TaxRate;
}

/// The product's own taxes, no partner remapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductTaxResolver;

impl TaxResolver for ProductTaxResolver {
    fn resolve(&self, product_taxes: &[SaleTax], _partner: Option<PartnerId>) -> TaxRate {
        TaxRate::from_taxes(product_taxes)
    }
}

/// Tax substitutions for a class of partners (exports, exempt customers).
///
/// A source tax mapped to `None` is dropped; unmapped taxes pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiscalPosition {
    pub name: String,
    pub tax_map: HashMap<TaxId, Option<SaleTax>>,
}

impl FiscalPosition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_map: HashMap::new(),
        }
    }

    pub fn replace(mut self, source: TaxId, destination: SaleTax) -> Self {
        self.tax_map.insert(source, Some(destination));
        self
    }

    pub fn exempt(mut self, source: TaxId) -> Self {
        self.tax_map.insert(source, None);
        self
    }

    pub fn map_taxes(&self, taxes: &[SaleTax]) -> Vec<SaleTax> {
        taxes
            .iter()
            .filter_map(|tax| match self.tax_map.get(&tax.id) {
                Some(mapped) => mapped.clone(),
                None => Some(tax.clone()),
            })
            .collect()
    }
}

/// Partner-aware resolver: remaps the product's taxes through the partner's
/// fiscal position, if one is assigned.
#[derive(Debug, Clone, Default)]
pub struct FiscalPositionResolver {
    positions: HashMap<PartnerId, FiscalPosition>,
}

impl FiscalPositionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, partner: PartnerId, position: FiscalPosition) {
        self.positions.insert(partner, position);
    }
}

impl TaxResolver for FiscalPositionResolver {
    fn resolve(&self, product_taxes: &[SaleTax], partner: Option<PartnerId>) -> TaxRate {
        match partner.and_then(|p| self.positions.get(&p)) {
            Some(position) => TaxRate::from_taxes(&position.map_taxes(product_taxes)),
            None => TaxRate::from_taxes(product_taxes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iva19() -> SaleTax {
        SaleTax::percent("IVA19", "IVA 19%", Decimal::from(19))
    }

    #[test]
    fn rate_sums_percentage_sale_taxes() {
        let taxes = vec![
            iva19(),
            SaleTax::percent("ICO8", "Impoconsumo 8%", Decimal::from(8)),
        ];
        assert_eq!(TaxRate::from_taxes(&taxes).fraction(), Decimal::new(27, 2));
    }

    #[test]
    fn fixed_and_purchase_taxes_are_ignored() {
        let taxes = vec![
            iva19(),
            SaleTax {
                id: TaxId::new("BAG"),
                name: "Bag levy".into(),
                amount_type: TaxAmountType::Fixed,
                scope: TaxScope::Sale,
                amount: Decimal::from(50),
            },
            SaleTax {
                id: TaxId::new("RET"),
                name: "Withholding".into(),
                amount_type: TaxAmountType::Percent,
                scope: TaxScope::Purchase,
                amount: Decimal::new(25, 1),
            },
        ];
        assert_eq!(TaxRate::from_taxes(&taxes).fraction(), Decimal::new(19, 2));
    }

    #[test]
    fn no_taxes_is_zero_rate() {
        assert!(TaxRate::from_taxes(std::iter::empty()).is_zero());
    }

    #[test]
    fn fiscal_position_remaps_only_assigned_partner() {
        let exporter = PartnerId::new();
        let local = PartnerId::new();
        let mut resolver = FiscalPositionResolver::new();
        resolver.assign(exporter, FiscalPosition::new("Export").exempt(TaxId::new("IVA19")));

        let taxes = vec![iva19()];
        assert!(resolver.resolve(&taxes, Some(exporter)).is_zero());
        assert_eq!(resolver.resolve(&taxes, Some(local)).fraction(), Decimal::new(19, 2));
        assert_eq!(resolver.resolve(&taxes, None).fraction(), Decimal::new(19, 2));
    }

    #[test]
    fn fiscal_position_replacement_changes_rate() {
        let partner = PartnerId::new();
        let mut resolver = FiscalPositionResolver::new();
        resolver.assign(
            partner,
            FiscalPosition::new("Reduced")
                .replace(TaxId::new("IVA19"), SaleTax::percent("IVA5", "IVA 5%", Decimal::from(5))),
        );
        let rate = resolver.resolve(&[iva19()], Some(partner));
        assert_eq!(rate.fraction(), Decimal::new(5, 2));
    }
}
