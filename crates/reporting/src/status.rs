//! Status breakdowns and label counts for dashboard tiles.

use appdesk_core::types::{Subscription, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Count and share of one status value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusShare<S> {
    pub status: S,
    pub count: u64,
    /// `count / total * 100`, one decimal place.
    pub percentage: f64,
}

/// Count and share of one free-form label (ticket status names and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

/// `count / total * 100` rounded to one decimal; 0 for an empty total.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

/// One share per entry of `statuses`, in that order. Items whose key is not
/// listed still count towards the total.
pub fn breakdown_by<T, S, F>(items: &[T], statuses: &[S], key: F) -> Vec<StatusShare<S>>
where
    S: Copy + PartialEq,
    F: Fn(&T) -> S,
{
    let total = items.len() as u64;
    statuses
        .iter()
        .map(|status| {
            let count = items.iter().filter(|item| key(item) == *status).count() as u64;
            StatusShare {
                status: *status,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

/// Subscription tile: active, trial, cancelled, expired.
pub fn status_breakdown(subscriptions: &[Subscription]) -> Vec<StatusShare<SubscriptionStatus>> {
    breakdown_by(subscriptions, &SubscriptionStatus::ALL, |s| s.status)
}

/// Group-count by label, most frequent first; equal counts sort by label.
pub fn count_by<T, F>(items: &[T], label: F) -> Vec<LabelCount>
where
    F: Fn(&T) -> String,
{
    let total = items.len() as u64;
    let mut counts: HashMap<String, u64> = HashMap::new();
    for item in items {
        *counts.entry(label(item)).or_default() += 1;
    }

    let mut rows: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label,
            count,
            percentage: percentage(count, total),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}
