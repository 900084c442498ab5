//! Pricing calculator: pure functions of the cart subtotal.
//!
//! All amounts are whole currency units. The same quote feeds both display
//! and the amount actually charged, so the two can never diverge.

use crate::{config::AppConfig, errors::ServiceError, models::payment::PaymentMethod};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Round-half-up to the nearest whole currency unit.
pub fn round_to_unit(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed-rate pricing rules, sourced from configuration.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    tax_rate: Decimal,
    cod_advance_rate: Decimal,
    min_online_amount: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: dec!(0.18),
            cod_advance_rate: dec!(0.10),
            min_online_amount: dec!(500),
        }
    }
}

impl PricingPolicy {
    pub fn new(tax_rate: Decimal, cod_advance_rate: Decimal, min_online_amount: Decimal) -> Self {
        Self {
            tax_rate,
            cod_advance_rate,
            min_online_amount,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            tax_rate: Decimal::from_f64_retain(cfg.tax_rate).unwrap_or_else(|| dec!(0.18)),
            cod_advance_rate: Decimal::from_f64_retain(cfg.cod_advance_rate)
                .unwrap_or_else(|| dec!(0.10)),
            min_online_amount: Decimal::from(cfg.min_online_amount),
        }
    }

    pub fn min_online_amount(&self) -> Decimal {
        self.min_online_amount
    }

    /// Derives the full price breakdown for a subtotal.
    pub fn quote(&self, subtotal: Decimal) -> PriceQuote {
        let tax = round_to_unit(subtotal * self.tax_rate);
        let total = subtotal + tax;
        let cod_advance = round_to_unit(subtotal * self.cod_advance_rate);

        PriceQuote {
            subtotal,
            tax,
            total,
            cod_advance,
        }
    }

    /// The online path is only selectable above the configured minimum;
    /// cash-on-delivery is always available.
    pub fn ensure_method_eligible(
        &self,
        method: PaymentMethod,
        subtotal: Decimal,
    ) -> Result<(), ServiceError> {
        match method {
            PaymentMethod::Cod => Ok(()),
            PaymentMethod::Online if subtotal >= self.min_online_amount => Ok(()),
            PaymentMethod::Online => Err(ServiceError::PaymentMethodIneligible(format!(
                "online payment requires a subtotal of at least {}, got {}",
                self.min_online_amount, subtotal
            ))),
        }
    }
}

/// Derived price breakdown for one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceQuote {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Collected immediately when cash-on-delivery is chosen
    pub cod_advance: Decimal,
}

impl PriceQuote {
    /// The remainder collected at physical delivery on the COD path.
    pub fn due_on_delivery(&self) -> Decimal {
        self.total - self.cod_advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn reference_quote_1749() {
        let quote = PricingPolicy::default().quote(dec!(1749));
        assert_eq!(quote.tax, dec!(315));
        assert_eq!(quote.total, dec!(2064));
        assert_eq!(quote.cod_advance, dec!(175));
        assert_eq!(quote.due_on_delivery(), dec!(1889));
    }

    #[test]
    fn reference_cod_advance_2000() {
        let quote = PricingPolicy::default().quote(dec!(2000));
        assert_eq!(quote.cod_advance, dec!(200));
    }

    #[rstest]
    #[case(dec!(0), dec!(0), dec!(0))]
    #[case(dec!(100), dec!(18), dec!(118))]
    #[case(dec!(999), dec!(180), dec!(1179))] // 179.82 rounds up
    #[case(dec!(25), dec!(5), dec!(30))] // 4.5 rounds half-up to 5
    fn tax_law(#[case] subtotal: Decimal, #[case] tax: Decimal, #[case] total: Decimal) {
        let quote = PricingPolicy::default().quote(subtotal);
        assert_eq!(quote.tax, tax);
        assert_eq!(quote.total, total);
    }

    #[rstest]
    #[case(dec!(5), dec!(1))] // 0.5 rounds half-up to 1
    #[case(dec!(44), dec!(4))] // 4.4 rounds down
    #[case(dec!(46), dec!(5))] // 4.6 rounds up
    fn cod_advance_rounding(#[case] subtotal: Decimal, #[case] advance: Decimal) {
        assert_eq!(PricingPolicy::default().quote(subtotal).cod_advance, advance);
    }

    #[test]
    fn online_gate_sits_exactly_at_the_minimum() {
        let policy = PricingPolicy::default();

        assert!(policy
            .ensure_method_eligible(PaymentMethod::Online, dec!(499))
            .is_err());
        assert!(policy
            .ensure_method_eligible(PaymentMethod::Online, dec!(500))
            .is_ok());
        assert!(policy
            .ensure_method_eligible(PaymentMethod::Online, dec!(501))
            .is_ok());
    }

    #[test]
    fn cod_is_always_eligible() {
        let policy = PricingPolicy::default();
        assert!(policy
            .ensure_method_eligible(PaymentMethod::Cod, dec!(1))
            .is_ok());
        assert!(policy
            .ensure_method_eligible(PaymentMethod::Cod, dec!(0))
            .is_ok());
    }

    #[test]
    fn quoting_is_idempotent() {
        let policy = PricingPolicy::default();
        let first = policy.quote(dec!(1749));
        let second = policy.quote(dec!(1749));
        assert_eq!(first, second);
    }

    proptest! {
        /// For whole-unit subtotals: the total is subtotal plus tax, every
        /// derived amount lands on a whole unit, and both rounded amounts
        /// stay within half a unit of the exact product.
        #[test]
        fn pricing_laws_hold(subtotal_units in 0u64..100_000_000) {
            let subtotal = Decimal::from(subtotal_units);
            let quote = PricingPolicy::default().quote(subtotal);

            prop_assert_eq!(quote.total, quote.subtotal + quote.tax);
            prop_assert_eq!(quote.tax.fract(), Decimal::ZERO);
            prop_assert_eq!(quote.cod_advance.fract(), Decimal::ZERO);

            let half = dec!(0.5);
            prop_assert!((quote.tax - subtotal * dec!(0.18)).abs() <= half);
            prop_assert!((quote.cod_advance - subtotal * dec!(0.10)).abs() <= half);
            prop_assert!(quote.cod_advance <= quote.total);
        }
    }
}
