//! Revenue aggregation: totals, calendar-month revenue, monthly trends,
//! recurring revenue, and per-app / per-customer revenue.

use appdesk_core::types::{Payment, Subscription, SubscriptionStatus};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One month of a revenue trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Short month name and year, e.g. `"Mar 2026"`.
    pub label: String,
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub revenue: f64,
}

/// Revenue attributed to one key (app or customer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRevenue {
    pub id: Uuid,
    pub revenue: f64,
}

/// Sum of `amount` over completed payments only.
pub fn total_revenue(payments: &[Payment]) -> f64 {
    payments
        .iter()
        .filter(|p| p.is_completed())
        .map(|p| p.amount)
        .sum()
}

/// Sum of `amount` over payments dated in the calendar month of `reference`.
pub fn monthly_revenue(payments: &[Payment], reference: NaiveDate) -> f64 {
    payments
        .iter()
        .filter(|p| {
            let date = p.payment_date.date_naive();
            date.year() == reference.year() && date.month() == reference.month()
        })
        .map(|p| p.amount)
        .sum()
}

/// Longest trend window, in months.
pub const MAX_TREND_MONTHS: u32 = 120;

/// `month_count` monthly buckets ending with `today`'s month, oldest first,
/// capped at [`MAX_TREND_MONTHS`]. Payments outside the window are ignored;
/// input order does not matter.
pub fn monthly_trend(payments: &[Payment], month_count: u32, today: NaiveDate) -> Vec<TrendPoint> {
    let month_count = month_count.min(MAX_TREND_MONTHS);
    if month_count == 0 {
        return Vec::new();
    }

    let last = month_index(today.year(), today.month());
    let first = last - (month_count as i64 - 1);

    let mut buckets: Vec<TrendPoint> = (first..=last)
        .map(|index| {
            let year = index.div_euclid(12) as i32;
            let month = index.rem_euclid(12) as u32 + 1;
            TrendPoint {
                label: format!("{} {}", MONTH_NAMES[month as usize - 1], year),
                year,
                month,
                revenue: 0.0,
            }
        })
        .collect();

    for payment in payments {
        let date = payment.payment_date.date_naive();
        let index = month_index(date.year(), date.month());
        if (first..=last).contains(&index) {
            buckets[(index - first) as usize].revenue += payment.amount;
        }
    }
    buckets
}

fn month_index(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

/// Monthly recurring revenue: monthly-equivalent price of active subscriptions.
pub fn mrr(subscriptions: &[Subscription]) -> f64 {
    subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .map(|s| s.monthly_price())
        .sum()
}

pub fn arr(subscriptions: &[Subscription]) -> f64 {
    mrr(subscriptions) * 12.0
}

/// Completed revenue per app, resolved through each payment's subscription.
/// Highest first; ties keep first-seen order. Payments whose subscription is
/// not in `subscriptions` are skipped.
pub fn revenue_by_app(payments: &[Payment], subscriptions: &[Subscription]) -> Vec<KeyedRevenue> {
    let app_of: HashMap<Uuid, Uuid> = subscriptions.iter().map(|s| (s.id, s.app_id)).collect();
    accumulate(
        payments
            .iter()
            .filter(|p| p.is_completed())
            .filter_map(|p| app_of.get(&p.subscription_id).map(|app| (*app, p.amount))),
    )
}

/// Completed revenue per customer, highest first.
pub fn revenue_by_customer(payments: &[Payment]) -> Vec<KeyedRevenue> {
    accumulate(
        payments
            .iter()
            .filter(|p| p.is_completed())
            .map(|p| (p.customer_id, p.amount)),
    )
}

fn accumulate(amounts: impl Iterator<Item = (Uuid, f64)>) -> Vec<KeyedRevenue> {
    let mut position: HashMap<Uuid, usize> = HashMap::new();
    let mut rows: Vec<KeyedRevenue> = Vec::new();
    for (id, amount) in amounts {
        let slot = *position.entry(id).or_insert_with(|| {
            rows.push(KeyedRevenue { id, revenue: 0.0 });
            rows.len() - 1
        });
        rows[slot].revenue += amount;
    }
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdesk_core::types::{BillingCycle, PaymentStatus};
    use chrono::{TimeZone, Utc};

    fn payment(amount: f64, status: PaymentStatus, y: i32, m: u32, d: u32) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            amount,
            status,
            payment_date: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            payment_method: None,
        }
    }

    fn subscription(status: SubscriptionStatus, price: f64, billing: BillingCycle) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status,
            price,
            billing,
            start_date: Utc::now(),
            end_date: None,
            enabled_features: vec![],
        }
    }

    #[test]
    fn total_revenue_counts_only_completed() {
        let payments = vec![
            payment(100.0, PaymentStatus::Completed, 2026, 1, 5),
            payment(40.0, PaymentStatus::Pending, 2026, 1, 6),
            payment(60.0, PaymentStatus::Failed, 2026, 1, 7),
            payment(25.5, PaymentStatus::Completed, 2026, 2, 1),
        ];
        assert_eq!(total_revenue(&payments), 125.5);
        assert_eq!(total_revenue(&[]), 0.0);
    }

    #[test]
    fn monthly_revenue_uses_calendar_month_not_rolling_window() {
        let payments = vec![
            payment(10.0, PaymentStatus::Completed, 2026, 3, 1),
            payment(20.0, PaymentStatus::Completed, 2026, 3, 31),
            payment(40.0, PaymentStatus::Completed, 2026, 2, 28),
            payment(80.0, PaymentStatus::Completed, 2025, 3, 15),
        ];
        let reference = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(monthly_revenue(&payments, reference), 30.0);
    }

    #[test]
    fn trend_buckets_unsorted_payments_by_month() {
        let payments = vec![
            payment(5.0, PaymentStatus::Completed, 2026, 3, 10),
            payment(7.0, PaymentStatus::Completed, 2025, 11, 2),
            payment(1.0, PaymentStatus::Completed, 2026, 3, 1),
            payment(99.0, PaymentStatus::Completed, 2025, 9, 30),
            payment(3.0, PaymentStatus::Completed, 2026, 1, 20),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 3, 18).unwrap();
        let trend = monthly_trend(&payments, 6, today);

        let labels: Vec<_> = trend.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Oct 2025", "Nov 2025", "Dec 2025", "Jan 2026", "Feb 2026", "Mar 2026"]
        );
        let revenue: Vec<_> = trend.iter().map(|p| p.revenue).collect();
        assert_eq!(revenue, vec![0.0, 7.0, 0.0, 3.0, 0.0, 6.0]);
    }

    #[test]
    fn zero_month_trend_is_empty() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 18).unwrap();
        assert!(monthly_trend(&[], 0, today).is_empty());
    }

    #[test]
    fn trend_window_is_capped() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let trend = monthly_trend(&[], u32::MAX, today);
        assert_eq!(trend.len(), MAX_TREND_MONTHS as usize);
        assert_eq!((trend[0].year, trend[0].month), (2016, 7));
        assert_eq!((trend.last().unwrap().year, trend.last().unwrap().month), (2026, 6));
    }

    #[test]
    fn mrr_normalizes_yearly_and_skips_inactive() {
        let subs = vec![
            subscription(SubscriptionStatus::Active, 50.0, BillingCycle::Monthly),
            subscription(SubscriptionStatus::Active, 1200.0, BillingCycle::Yearly),
            subscription(SubscriptionStatus::Trial, 500.0, BillingCycle::Monthly),
            subscription(SubscriptionStatus::Cancelled, 500.0, BillingCycle::Monthly),
        ];
        assert_eq!(mrr(&subs), 150.0);
        assert_eq!(arr(&subs), 1800.0);
    }

    #[test]
    fn revenue_by_app_joins_through_subscription() {
        let mut crm = subscription(SubscriptionStatus::Active, 10.0, BillingCycle::Monthly);
        let mut erp = subscription(SubscriptionStatus::Active, 10.0, BillingCycle::Monthly);
        let crm_app = Uuid::new_v4();
        let erp_app = Uuid::new_v4();
        crm.app_id = crm_app;
        erp.app_id = erp_app;

        let mut p1 = payment(30.0, PaymentStatus::Completed, 2026, 1, 1);
        p1.subscription_id = crm.id;
        let mut p2 = payment(90.0, PaymentStatus::Completed, 2026, 1, 2);
        p2.subscription_id = erp.id;
        let mut p3 = payment(500.0, PaymentStatus::Failed, 2026, 1, 3);
        p3.subscription_id = crm.id;
        let orphan = payment(1000.0, PaymentStatus::Completed, 2026, 1, 4);

        let rows = revenue_by_app(&[p1, p2, p3, orphan], &[crm, erp]);
        assert_eq!(
            rows,
            vec![
                KeyedRevenue { id: erp_app, revenue: 90.0 },
                KeyedRevenue { id: crm_app, revenue: 30.0 },
            ]
        );
    }
}
