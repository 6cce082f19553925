//! Lifecycle estimators: churn, revenue per customer, subscription age.
//!
//! Point-in-time figures only, with no cohort or survivorship adjustment.

use appdesk_core::types::{Payment, Subscription, SubscriptionStatus};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::revenue::total_revenue;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Share of cancelled subscriptions, as a whole percentage.
pub fn churn_rate(subscriptions: &[Subscription]) -> u32 {
    if subscriptions.is_empty() {
        return 0;
    }
    let cancelled = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Cancelled)
        .count();
    (cancelled as f64 / subscriptions.len() as f64 * 100.0).round() as u32
}

/// Completed revenue divided by the number of distinct subscribing
/// customers, rounded to a whole amount.
pub fn average_revenue_per_customer(payments: &[Payment], subscriptions: &[Subscription]) -> f64 {
    let customers: HashSet<_> = subscriptions.iter().map(|s| s.customer_id).collect();
    if customers.is_empty() {
        return 0.0;
    }
    (total_revenue(payments) / customers.len() as f64).round()
}

/// Mean age in days of active subscriptions at `now`. Other statuses are
/// ignored even when passed in.
pub fn average_lifetime_days(subscriptions: &[Subscription], now: DateTime<Utc>) -> f64 {
    let ages: Vec<f64> = subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .map(|s| (now - s.start_date).num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();
    if ages.is_empty() {
        return 0.0;
    }
    ages.iter().sum::<f64>() / ages.len() as f64
}
