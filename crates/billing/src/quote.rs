//! Subscription quotes: resolve a plan and the features picked on the
//! subscribe form into a price and an enabled-feature snapshot.

use appdesk_core::types::{Feature, Plan, Subscription, SubscriptionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::pricing::{PriceBreakdown, PricingInput};

/// An add-on feature charged on top of the plan price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedFeature {
    pub feature_id: Uuid,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionQuote {
    pub plan_id: Uuid,
    pub app_id: Uuid,
    pub add_ons: Vec<QuotedFeature>,
    /// Plan features, then the app's default features, then add-ons.
    pub enabled_features: Vec<Uuid>,
    /// Selected ids that were neither included nor eligible as add-ons
    /// (other app, inactive, or unknown).
    pub skipped: Vec<Uuid>,
    pub price: PriceBreakdown,
}

impl SubscriptionQuote {
    /// Price `plan` with the `selected` features of its app.
    ///
    /// Features the plan already includes and active default features are
    /// enabled at no charge. Other active features of the same app become
    /// add-ons priced at their `base_price`.
    pub fn build(
        plan: &Plan,
        features: &[Feature],
        selected: &[Uuid],
        custom_discount_percent: f64,
    ) -> Self {
        let mut enabled: Vec<Uuid> = Vec::new();
        for id in &plan.features {
            push_unique(&mut enabled, *id);
        }
        for feature in features
            .iter()
            .filter(|f| f.app_id == plan.app_id && f.is_default && f.is_active())
        {
            push_unique(&mut enabled, feature.id);
        }

        let mut add_ons = Vec::new();
        let mut skipped = Vec::new();
        for id in selected {
            if enabled.contains(id) {
                continue;
            }
            match features.iter().find(|f| f.id == *id) {
                Some(f) if f.app_id == plan.app_id && f.is_active() => {
                    add_ons.push(QuotedFeature {
                        feature_id: f.id,
                        name: f.name.clone(),
                        price: f.base_price,
                    });
                    push_unique(&mut enabled, f.id);
                }
                _ => {
                    debug!(plan_id = %plan.id, feature_id = %id, "Selected feature not eligible for plan");
                    skipped.push(*id);
                }
            }
        }

        let price = PricingInput::new(plan.price, plan.billing)
            .with_features(add_ons.iter().map(|a| a.price))
            .with_plan_discount(plan.discount_percentage)
            .with_custom_discount(custom_discount_percent)
            .compute();

        Self {
            plan_id: plan.id,
            app_id: plan.app_id,
            add_ons,
            enabled_features: enabled,
            skipped,
            price,
        }
    }

    /// The subscription row to insert for `customer_id`. The feature list is
    /// copied, so later feature edits leave the subscription untouched.
    pub fn into_subscription(
        self,
        customer_id: Uuid,
        status: SubscriptionStatus,
        start_date: DateTime<Utc>,
    ) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            customer_id,
            app_id: self.app_id,
            plan_id: self.plan_id,
            status,
            price: self.price.final_price,
            billing: self.price.billing,
            start_date,
            end_date: None,
            enabled_features: self.enabled_features,
        }
    }
}

fn push_unique(ids: &mut Vec<Uuid>, id: Uuid) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
