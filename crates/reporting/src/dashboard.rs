//! Back-office dashboard: every overview tile computed in one pass over the
//! fetched collections.

use appdesk_core::config::ReportingConfig;
use appdesk_core::types::{
    App, AppStatus, Customer, CustomerStatus, Payment, PaymentStatus, Plan, Subscription,
    SubscriptionStatus, Ticket, TicketPriority, TicketStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::capacity::{plan_capacity, PlanCapacity};
use crate::estimators::{average_lifetime_days, average_revenue_per_customer, churn_rate};
use crate::ranking::top_n;
use crate::revenue::{self, monthly_revenue, monthly_trend, total_revenue, TrendPoint};
use crate::status::{breakdown_by, count_by, status_breakdown, LabelCount, StatusShare};

/// Label used for tickets whose lookup row no longer exists.
const UNKNOWN_LABEL: &str = "Unknown";

/// Borrowed view over everything the overview needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardInput<'a> {
    pub apps: &'a [App],
    pub customers: &'a [Customer],
    pub plans: &'a [Plan],
    pub subscriptions: &'a [Subscription],
    pub payments: &'a [Payment],
    pub tickets: &'a [Ticket],
    pub ticket_statuses: &'a [TicketStatus],
    pub ticket_priorities: &'a [TicketPriority],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedApp {
    pub app_id: Uuid,
    pub name: String,
    pub revenue: f64,
    pub subscribers: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCustomer {
    pub customer_id: Uuid,
    pub company: Option<String>,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub total_revenue: f64,
    pub revenue_this_month: f64,
    pub mrr: f64,
    pub arr: f64,
    pub total_customers: u64,
    pub active_subscriptions: u64,
    pub subscription_breakdown: Vec<StatusShare<SubscriptionStatus>>,
    pub payment_breakdown: Vec<StatusShare<PaymentStatus>>,
    pub customer_breakdown: Vec<StatusShare<CustomerStatus>>,
    pub app_breakdown: Vec<StatusShare<AppStatus>>,
    pub churn_rate: u32,
    pub average_revenue_per_customer: f64,
    pub average_lifetime_days: f64,
    pub top_apps: Vec<RankedApp>,
    pub top_customers: Vec<RankedCustomer>,
    pub revenue_trend: Vec<TrendPoint>,
    pub plan_capacity: PlanCapacity,
    pub tickets_by_status: Vec<LabelCount>,
    pub tickets_by_priority: Vec<LabelCount>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardOverview {
    pub fn build(input: &DashboardInput<'_>, options: &ReportingConfig, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let completed: Vec<Payment> = input
            .payments
            .iter()
            .filter(|p| p.is_completed())
            .cloned()
            .collect();

        let top_apps = top_n(input.apps, |a| a.revenue, options.top_n)
            .into_iter()
            .map(|a| RankedApp {
                app_id: a.id,
                name: a.name.clone(),
                revenue: a.revenue,
                subscribers: a.subscribers,
            })
            .collect();

        let companies: HashMap<Uuid, &str> = input
            .customers
            .iter()
            .map(|c| (c.id, c.company.as_str()))
            .collect();
        let top_customers = revenue::revenue_by_customer(input.payments)
            .into_iter()
            .take(options.top_n)
            .map(|r| RankedCustomer {
                customer_id: r.id,
                company: companies.get(&r.id).map(|c| c.to_string()),
                revenue: r.revenue,
            })
            .collect();

        let status_names: HashMap<Uuid, &str> = input
            .ticket_statuses
            .iter()
            .map(|s| (s.0.id, s.0.name.as_str()))
            .collect();
        let priority_names: HashMap<Uuid, &str> = input
            .ticket_priorities
            .iter()
            .map(|p| (p.0.id, p.0.name.as_str()))
            .collect();

        let overview = Self {
            total_revenue: total_revenue(input.payments),
            revenue_this_month: monthly_revenue(&completed, today),
            mrr: revenue::mrr(input.subscriptions),
            arr: revenue::arr(input.subscriptions),
            total_customers: input.customers.len() as u64,
            active_subscriptions: input
                .subscriptions
                .iter()
                .filter(|s| s.status == SubscriptionStatus::Active)
                .count() as u64,
            subscription_breakdown: status_breakdown(input.subscriptions),
            payment_breakdown: breakdown_by(input.payments, &PaymentStatus::ALL, |p| p.status),
            customer_breakdown: breakdown_by(input.customers, &CustomerStatus::ALL, |c| c.status),
            app_breakdown: breakdown_by(input.apps, &AppStatus::ALL, |a| a.status),
            churn_rate: churn_rate(input.subscriptions),
            average_revenue_per_customer: average_revenue_per_customer(
                input.payments,
                input.subscriptions,
            ),
            average_lifetime_days: average_lifetime_days(input.subscriptions, now),
            top_apps,
            top_customers,
            revenue_trend: monthly_trend(&completed, options.trend_months, today),
            plan_capacity: plan_capacity(input.plans),
            tickets_by_status: count_by(input.tickets, |t| label_of(&status_names, t.status_id)),
            tickets_by_priority: count_by(input.tickets, |t| label_of(&priority_names, t.priority_id)),
            generated_at: now,
        };

        debug!(
            subscriptions = input.subscriptions.len(),
            payments = input.payments.len(),
            total_revenue = overview.total_revenue,
            "Dashboard overview built"
        );
        overview
    }
}

fn label_of(names: &HashMap<Uuid, &str>, id: Uuid) -> String {
    names.get(&id).copied().unwrap_or(UNKNOWN_LABEL).to_string()
}
