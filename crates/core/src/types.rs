//! Domain types for the AppDesk back office: apps, plans, features,
//! customers, subscriptions, payments, and support tickets.
//!
//! Every entity is owned by the hosted data store; these structs mirror its
//! rows one-to-one and round-trip through serde unchanged.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Tables ────────────────────────────────────────────────────────────────

/// Tables exposed by the hosted data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Apps,
    Customers,
    Features,
    Plans,
    Subscriptions,
    Payments,
    Tickets,
    TicketCategories,
    TicketPriorities,
    TicketStatuses,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Apps => "apps",
            Table::Customers => "customers",
            Table::Features => "features",
            Table::Plans => "plans",
            Table::Subscriptions => "subscriptions",
            Table::Payments => "payments",
            Table::Tickets => "tickets",
            Table::TicketCategories => "ticket_categories",
            Table::TicketPriorities => "ticket_priorities",
            Table::TicketStatuses => "ticket_statuses",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row type stored in one table and addressed by its `id` column.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;
    /// Human-readable entity name used in errors and logs.
    const NAME: &'static str;

    fn id(&self) -> Uuid;
}

macro_rules! entity {
    ($ty:ty, $table:expr, $name:literal) => {
        impl Entity for $ty {
            const TABLE: Table = $table;
            const NAME: &'static str = $name;

            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
}

// ─── Shared enums ──────────────────────────────────────────────────────────

/// Billing cycle of a plan or subscription price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

/// Converts a price tagged with one billing cycle into its counterpart.
impl BillingCycle {
    pub fn monthly_equivalent(&self, price: f64) -> f64 {
        match self {
            BillingCycle::Monthly => price,
            BillingCycle::Yearly => price / 12.0,
        }
    }

    pub fn yearly_equivalent(&self, price: f64) -> f64 {
        match self {
            BillingCycle::Monthly => price * 12.0,
            BillingCycle::Yearly => price,
        }
    }
}

// ─── App ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Active,
    Inactive,
    Maintenance,
}

impl AppStatus {
    pub const ALL: [AppStatus; 3] = [AppStatus::Active, AppStatus::Inactive, AppStatus::Maintenance];
}

/// A resold application. `api_endpoint`/`api_key` point at the vendor's
/// feature-code API when the integration is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub status: AppStatus,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub subscribers: u64,
    pub version: String,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

entity!(App, Table::Apps, "app");

// ─── Customer ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Suspended,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 3] = [
        CustomerStatus::Active,
        CustomerStatus::Inactive,
        CustomerStatus::Suspended,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub company: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
}

entity!(Customer, Table::Customers, "customer");

// ─── Feature ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    Active,
    Inactive,
}

/// A billable capability of an app. `feature_code` optionally maps it to the
/// vendor's own identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub feature_type: String,
    pub base_price: f64,
    pub status: FeatureStatus,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub feature_code: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

entity!(Feature, Table::Features, "feature");

impl Feature {
    pub fn is_active(&self) -> bool {
        self.status == FeatureStatus::Active
    }
}

// ─── Plan ──────────────────────────────────────────────────────────────────

/// `max_users` value meaning "no seat limit".
pub const UNLIMITED_USERS: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    pub price: f64,
    pub billing: BillingCycle,
    pub currency: String,
    #[serde(default)]
    pub discount_percentage: f64,
    pub max_users: i32,
    #[serde(default)]
    pub features: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

entity!(Plan, Table::Plans, "plan");

impl Plan {
    /// Seat limit, or `None` for unlimited plans. Only positive limits are
    /// meaningful; anything else the store hands back is treated as unlimited.
    pub fn user_limit(&self) -> Option<u32> {
        u32::try_from(self.max_users).ok().filter(|n| *n > 0)
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_users == UNLIMITED_USERS
    }

    pub fn includes_feature(&self, feature_id: Uuid) -> bool {
        self.features.contains(&feature_id)
    }
}

// ─── Subscription ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Trial,
        SubscriptionStatus::Cancelled,
        SubscriptionStatus::Expired,
    ];
}

/// A customer's subscription to a plan. `enabled_features` is the feature
/// set captured at subscribe time and is never rewritten by feature edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub app_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub price: f64,
    pub billing: BillingCycle,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enabled_features: Vec<Uuid>,
}

entity!(Subscription, Table::Subscriptions, "subscription");

impl Subscription {
    pub fn monthly_price(&self) -> f64 {
        self.billing.monthly_equivalent(self.price)
    }
}

// ─── Payment ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Completed,
        PaymentStatus::Pending,
        PaymentStatus::Failed,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub subscription_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

entity!(Payment, Table::Payments, "payment");

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }
}

// ─── Tickets ───────────────────────────────────────────────────────────────

/// Support ticket. Category, priority, and status are references into the
/// lookup tables rather than fixed enums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    #[serde(default)]
    pub app_id: Option<Uuid>,
    pub category_id: Uuid,
    pub priority_id: Uuid,
    pub status_id: Uuid,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

entity!(Ticket, Table::Tickets, "ticket");

/// Row of one of the ticket lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupValue {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TicketCategory(pub LookupValue);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TicketPriority(pub LookupValue);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TicketStatus(pub LookupValue);

macro_rules! lookup_entity {
    ($ty:ty, $table:expr, $name:literal) => {
        impl Entity for $ty {
            const TABLE: Table = $table;
            const NAME: &'static str = $name;

            fn id(&self) -> Uuid {
                self.0.id
            }
        }
    };
}

lookup_entity!(TicketCategory, Table::TicketCategories, "ticket category");
lookup_entity!(TicketPriority, Table::TicketPriorities, "ticket priority");
lookup_entity!(TicketStatus, Table::TicketStatuses, "ticket status");

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(max_users: i32) -> Plan {
        Plan {
            id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            name: "Team".into(),
            price: 49.0,
            billing: BillingCycle::Monthly,
            currency: "USD".into(),
            discount_percentage: 0.0,
            max_users,
            features: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unlimited_sentinel_has_no_user_limit() {
        assert_eq!(plan(UNLIMITED_USERS).user_limit(), None);
        assert!(plan(UNLIMITED_USERS).is_unlimited());
        assert_eq!(plan(25).user_limit(), Some(25));
    }

    #[test]
    fn billing_cycle_equivalents() {
        assert_eq!(BillingCycle::Monthly.yearly_equivalent(10.0), 120.0);
        assert_eq!(BillingCycle::Yearly.monthly_equivalent(120.0), 10.0);
        assert_eq!(BillingCycle::Yearly.yearly_equivalent(120.0), 120.0);
    }

    #[test]
    fn lookup_rows_deserialize_transparently() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({ "id": id, "name": "Urgent", "color": "#ff0000" });
        let priority: TicketPriority = serde_json::from_value(json).unwrap();
        assert_eq!(priority.id(), id);
        assert_eq!(priority.0.name, "Urgent");
    }

    #[test]
    fn statuses_use_lowercase_wire_names() {
        let json = serde_json::to_string(&SubscriptionStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert_eq!(Table::TicketStatuses.to_string(), "ticket_statuses");
    }
}
