//! List-view rows: entities joined with the display names of the rows they
//! reference. A reference that no longer resolves renders as `None`.

use std::collections::HashMap;

use appdesk_core::types::{
    App, Customer, Entity, Feature, Payment, Plan, Subscription, Ticket, TicketCategory,
    TicketPriority, TicketStatus,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRow {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub customer_company: Option<String>,
    pub customer_name: Option<String>,
    pub app_name: Option<String>,
    pub plan_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRow {
    #[serde(flatten)]
    pub payment: Payment,
    pub customer_company: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    #[serde(flatten)]
    pub feature: Feature,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRow {
    #[serde(flatten)]
    pub plan: Plan,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketRow {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub customer_company: Option<String>,
    pub app_name: Option<String>,
    pub category_name: Option<String>,
    pub priority_name: Option<String>,
    pub status_name: Option<String>,
}

/// Lookup tables for the ticket foreign keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicketLookups<'a> {
    pub categories: &'a [TicketCategory],
    pub priorities: &'a [TicketPriority],
    pub statuses: &'a [TicketStatus],
}

fn index<T: Entity>(rows: &[T]) -> HashMap<Uuid, &T> {
    rows.iter().map(|r| (r.id(), r)).collect()
}

pub fn join_subscriptions(
    subscriptions: Vec<Subscription>,
    customers: &[Customer],
    apps: &[App],
    plans: &[Plan],
) -> Vec<SubscriptionRow> {
    let customers = index(customers);
    let apps = index(apps);
    let plans = index(plans);

    subscriptions
        .into_iter()
        .map(|subscription| {
            let customer = customers.get(&subscription.customer_id);
            SubscriptionRow {
                customer_company: customer.map(|c| c.company.clone()),
                customer_name: customer.map(|c| c.name.clone()),
                app_name: apps.get(&subscription.app_id).map(|a| a.name.clone()),
                plan_name: plans.get(&subscription.plan_id).map(|p| p.name.clone()),
                subscription,
            }
        })
        .collect()
}

pub fn join_payments(payments: Vec<Payment>, customers: &[Customer]) -> Vec<PaymentRow> {
    let customers = index(customers);
    payments
        .into_iter()
        .map(|payment| PaymentRow {
            customer_company: customers.get(&payment.customer_id).map(|c| c.company.clone()),
            payment,
        })
        .collect()
}

pub fn join_features(features: Vec<Feature>, apps: &[App]) -> Vec<FeatureRow> {
    let apps = index(apps);
    features
        .into_iter()
        .map(|feature| FeatureRow {
            app_name: apps.get(&feature.app_id).map(|a| a.name.clone()),
            feature,
        })
        .collect()
}

pub fn join_plans(plans: Vec<Plan>, apps: &[App]) -> Vec<PlanRow> {
    let apps = index(apps);
    plans
        .into_iter()
        .map(|plan| PlanRow {
            app_name: apps.get(&plan.app_id).map(|a| a.name.clone()),
            plan,
        })
        .collect()
}

pub fn join_tickets(
    tickets: Vec<Ticket>,
    customers: &[Customer],
    apps: &[App],
    lookups: TicketLookups<'_>,
) -> Vec<TicketRow> {
    let customers = index(customers);
    let apps = index(apps);
    let categories = index(lookups.categories);
    let priorities = index(lookups.priorities);
    let statuses = index(lookups.statuses);

    tickets
        .into_iter()
        .map(|ticket| TicketRow {
            customer_company: customers.get(&ticket.customer_id).map(|c| c.company.clone()),
            app_name: ticket
                .app_id
                .and_then(|id| apps.get(&id))
                .map(|a| a.name.clone()),
            category_name: categories.get(&ticket.category_id).map(|c| c.0.name.clone()),
            priority_name: priorities.get(&ticket.priority_id).map(|p| p.0.name.clone()),
            status_name: statuses.get(&ticket.status_id).map(|s| s.0.name.clone()),
            ticket,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdesk_core::types::{
        AppStatus, BillingCycle, CustomerStatus, LookupValue, SubscriptionStatus,
    };
    use chrono::Utc;

    fn app(name: &str) -> App {
        App {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category: "crm".into(),
            status: AppStatus::Active,
            revenue: 0.0,
            subscribers: 0,
            version: "1.0".into(),
            api_endpoint: None,
            api_key: None,
            created_at: Utc::now(),
        }
    }

    fn customer(company: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            company: company.into(),
            name: "Grace".into(),
            email: "grace@example.com".into(),
            phone: None,
            status: CustomerStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn subscription(customer_id: Uuid, app_id: Uuid, plan_id: Uuid) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            customer_id,
            app_id,
            plan_id,
            status: SubscriptionStatus::Active,
            price: 10.0,
            billing: BillingCycle::Monthly,
            start_date: Utc::now(),
            end_date: None,
            enabled_features: vec![],
        }
    }

    #[test]
    fn subscription_rows_carry_display_names() {
        let crm = app("CRM");
        let acme = customer("Acme");
        let plan_id = Uuid::new_v4();
        let rows = join_subscriptions(
            vec![subscription(acme.id, crm.id, plan_id)],
            &[acme.clone()],
            &[crm.clone()],
            &[],
        );

        assert_eq!(rows[0].customer_company.as_deref(), Some("Acme"));
        assert_eq!(rows[0].customer_name.as_deref(), Some("Grace"));
        assert_eq!(rows[0].app_name.as_deref(), Some("CRM"));
        assert_eq!(rows[0].plan_name, None);
    }

    #[test]
    fn rows_serialize_flat() {
        let acme = customer("Acme");
        let sub = subscription(acme.id, Uuid::new_v4(), Uuid::new_v4());
        let rows = join_subscriptions(vec![sub.clone()], &[acme], &[], &[]);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["id"], serde_json::json!(sub.id));
        assert_eq!(json["status"], "active");
        assert_eq!(json["customer_company"], "Acme");
        assert!(json["app_name"].is_null());
    }

    #[test]
    fn ticket_rows_resolve_lookup_names() {
        let acme = customer("Acme");
        let urgent = TicketPriority(LookupValue {
            id: Uuid::new_v4(),
            name: "Urgent".into(),
            color: None,
        });
        let open = TicketStatus(LookupValue {
            id: Uuid::new_v4(),
            name: "Open".into(),
            color: Some("#00ff00".into()),
        });
        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: "Login fails".into(),
            description: "SSO loop".into(),
            customer_id: acme.id,
            app_id: None,
            category_id: Uuid::new_v4(),
            priority_id: urgent.0.id,
            status_id: open.0.id,
            assigned_to: None,
            due_date: None,
            created_at: Utc::now(),
        };

        let priorities = [urgent];
        let statuses = [open];
        let rows = join_tickets(
            vec![ticket],
            &[acme],
            &[],
            TicketLookups {
                priorities: &priorities,
                statuses: &statuses,
                ..TicketLookups::default()
            },
        );

        assert_eq!(rows[0].customer_company.as_deref(), Some("Acme"));
        assert_eq!(rows[0].app_name, None);
        assert_eq!(rows[0].category_name, None);
        assert_eq!(rows[0].priority_name.as_deref(), Some("Urgent"));
        assert_eq!(rows[0].status_name.as_deref(), Some("Open"));
    }
}
