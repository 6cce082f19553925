//! Pricing calculator: subtotal, stacked discounts, and billing-cycle
//! equivalents.
//!
//! The plan discount is applied first; the custom discount is then taken off
//! the already-discounted amount. The final price never drops below zero,
//! whatever the inputs.

use appdesk_core::types::BillingCycle;
use serde::{Deserialize, Serialize};

/// Everything the calculator needs. Percentages are expected in `[0, 100]`
/// (forms enforce that); out-of-range values still produce a non-negative
/// final price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub base_price: f64,
    pub feature_prices: Vec<f64>,
    pub plan_discount_percent: f64,
    pub custom_discount_percent: f64,
    pub billing: BillingCycle,
}

/// Full price breakdown, enough for a UI to render every line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: f64,
    pub plan_discount_amount: f64,
    pub after_plan_discount: f64,
    pub custom_discount_amount: f64,
    pub final_price: f64,
    pub billing: BillingCycle,
    pub monthly_equivalent: f64,
    pub yearly_equivalent: f64,
}

impl PricingInput {
    pub fn new(base_price: f64, billing: BillingCycle) -> Self {
        Self {
            base_price,
            billing,
            ..Self::default()
        }
    }

    pub fn with_features(mut self, prices: impl IntoIterator<Item = f64>) -> Self {
        self.feature_prices.extend(prices);
        self
    }

    pub fn with_plan_discount(mut self, percent: f64) -> Self {
        self.plan_discount_percent = percent;
        self
    }

    pub fn with_custom_discount(mut self, percent: f64) -> Self {
        self.custom_discount_percent = percent;
        self
    }

    pub fn compute(&self) -> PriceBreakdown {
        let subtotal = self.base_price + self.feature_prices.iter().sum::<f64>();

        let plan_discount_amount = subtotal * self.plan_discount_percent / 100.0;
        let after_plan_discount = subtotal - plan_discount_amount;

        let custom_discount_amount = after_plan_discount * self.custom_discount_percent / 100.0;
        let final_price = (after_plan_discount - custom_discount_amount).max(0.0);

        PriceBreakdown {
            subtotal,
            plan_discount_amount,
            after_plan_discount,
            custom_discount_amount,
            final_price,
            billing: self.billing,
            monthly_equivalent: self.billing.monthly_equivalent(final_price),
            yearly_equivalent: self.billing.yearly_equivalent(final_price),
        }
    }
}

impl PriceBreakdown {
    /// Combined discount across both stages.
    pub fn total_discount(&self) -> f64 {
        self.subtotal - self.final_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn discounts_compound() {
        let price = PricingInput::new(100.0, BillingCycle::Monthly)
            .with_features([20.0])
            .with_plan_discount(10.0)
            .with_custom_discount(10.0)
            .compute();

        assert!(approx(price.subtotal, 120.0));
        assert!(approx(price.plan_discount_amount, 12.0));
        assert!(approx(price.after_plan_discount, 108.0));
        assert!(approx(price.custom_discount_amount, 10.8));
        assert!(approx(price.final_price, 97.2));
        assert!(approx(price.total_discount(), 22.8));
    }

    #[test]
    fn malformed_discount_clamps_to_zero() {
        let price = PricingInput::new(100.0, BillingCycle::Monthly)
            .with_features([20.0])
            .with_plan_discount(150.0)
            .compute();
        assert_eq!(price.final_price, 0.0);
        assert_eq!(price.monthly_equivalent, 0.0);

        let stacked = PricingInput::new(50.0, BillingCycle::Yearly)
            .with_plan_discount(150.0)
            .with_custom_discount(10.0)
            .compute();
        assert_eq!(stacked.final_price, 0.0);
    }

    #[test]
    fn monthly_price_derives_yearly() {
        let price = PricingInput::new(25.0, BillingCycle::Monthly).compute();
        assert!(approx(price.monthly_equivalent, 25.0));
        assert!(approx(price.yearly_equivalent, 300.0));
    }

    #[test]
    fn yearly_price_derives_monthly() {
        let price = PricingInput::new(240.0, BillingCycle::Yearly).compute();
        assert!(approx(price.monthly_equivalent, 20.0));
        assert!(approx(price.yearly_equivalent, 240.0));
    }

    #[test]
    fn no_features_no_discounts_is_base_price() {
        let price = PricingInput::new(0.0, BillingCycle::Monthly).compute();
        assert_eq!(price.subtotal, 0.0);
        assert_eq!(price.final_price, 0.0);
    }
}
