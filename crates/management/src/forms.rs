//! Create / update requests for every editable entity.
//!
//! Requests are validated before anything reaches the store. Update requests
//! serialize to a sparse JSON patch: fields left `None` are not sent. Nullable
//! columns are `Option<Option<T>>`, where `Some(None)` clears the column.

use appdesk_core::types::{
    App, AppStatus, BillingCycle, Customer, CustomerStatus, Entity, Feature, FeatureStatus,
    Payment, PaymentStatus, Plan, Subscription, SubscriptionStatus, Ticket, UNLIMITED_USERS,
};
use appdesk_core::{AppDeskError, AppDeskResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A request that becomes a brand-new row.
pub trait CreateForm: Validate {
    type Entity: Entity;

    fn into_entity(self) -> AppDeskResult<Self::Entity>;
}

/// A request that patches an existing row.
pub trait UpdateForm: Validate + Serialize {
    type Entity: Entity;

    fn patch(&self) -> AppDeskResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn check_max_users(max_users: Option<i32>) -> Result<(), ValidationError> {
    match max_users {
        Some(n) if n != UNLIMITED_USERS && n < 1 => Err(validation_error(
            "max_users",
            "max_users must be -1 (unlimited) or at least 1",
        )),
        _ => Ok(()),
    }
}

/// Blank metadata counts as absent.
fn parse_metadata(raw: Option<&str>) -> Result<Option<Value>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_object() => Ok(Some(value)),
        _ => Err(validation_error("metadata", "metadata must be a JSON object")),
    }
}

/// Present-but-null deserializes to `Some(None)`; an absent field stays
/// `None` through `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_app_status() -> AppStatus {
    AppStatus::Active
}

fn default_customer_status() -> CustomerStatus {
    CustomerStatus::Active
}

fn default_feature_status() -> FeatureStatus {
    FeatureStatus::Active
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Pending
}

fn default_subscription_status() -> SubscriptionStatus {
    SubscriptionStatus::Active
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_feature_type() -> String {
    "addon".to_string()
}

// ─── Apps ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAppRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default = "default_app_status")]
    pub status: AppStatus,
    #[serde(default = "default_version")]
    #[validate(length(min = 1, max = 50))]
    pub version: String,
    #[validate(url)]
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl CreateForm for CreateAppRequest {
    type Entity = App;

    fn into_entity(self) -> AppDeskResult<App> {
        Ok(App {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            category: self.category,
            status: self.status,
            revenue: 0.0,
            subscribers: 0,
            version: self.version,
            api_endpoint: self.api_endpoint,
            api_key: self.api_key,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAppRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub api_endpoint: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Option<String>>,
}

impl UpdateForm for UpdateAppRequest {
    type Entity = App;
}

// ─── Customers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub company: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_customer_status")]
    pub status: CustomerStatus,
}

impl CreateForm for CreateCustomerRequest {
    type Entity = Customer;

    fn into_entity(self) -> AppDeskResult<Customer> {
        Ok(Customer {
            id: Uuid::new_v4(),
            company: self.company,
            name: self.name,
            email: self.email,
            phone: self.phone,
            status: self.status,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,
}

impl UpdateForm for UpdateCustomerRequest {
    type Entity = Customer;
}

// ─── Features ──────────────────────────────────────────────────────────────

/// `metadata` is the raw JSON text typed into the form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_feature"))]
pub struct CreateFeatureRequest {
    pub app_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_feature_type")]
    pub feature_type: String,
    #[validate(range(min = 0.0))]
    pub base_price: f64,
    #[serde(default = "default_feature_status")]
    pub status: FeatureStatus,
    #[serde(default)]
    pub is_default: bool,
    pub feature_code: Option<String>,
    pub metadata: Option<String>,
}

fn validate_create_feature(req: &CreateFeatureRequest) -> Result<(), ValidationError> {
    parse_metadata(req.metadata.as_deref()).map(|_| ())
}

impl CreateForm for CreateFeatureRequest {
    type Entity = Feature;

    fn into_entity(self) -> AppDeskResult<Feature> {
        let metadata = parse_metadata(self.metadata.as_deref())
            .map_err(|e| AppDeskError::Validation(e.to_string()))?;
        Ok(Feature {
            id: Uuid::new_v4(),
            app_id: self.app_id,
            name: self.name,
            description: self.description,
            feature_type: self.feature_type,
            base_price: self.base_price,
            status: self.status,
            is_default: self.is_default,
            feature_code: self.feature_code,
            metadata,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update_feature"))]
pub struct UpdateFeatureRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub base_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FeatureStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub feature_code: Option<Option<String>>,
    #[serde(skip_serializing)]
    pub metadata: Option<String>,
}

fn validate_update_feature(req: &UpdateFeatureRequest) -> Result<(), ValidationError> {
    parse_metadata(req.metadata.as_deref()).map(|_| ())
}

impl UpdateForm for UpdateFeatureRequest {
    type Entity = Feature;

    fn patch(&self) -> AppDeskResult<Value> {
        let mut patch = serde_json::to_value(self)?;
        let metadata = parse_metadata(self.metadata.as_deref())
            .map_err(|e| AppDeskError::Validation(e.to_string()))?;
        if let Some(metadata) = metadata {
            patch["metadata"] = metadata;
        }
        Ok(patch)
    }
}

// ─── Plans ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_plan"))]
pub struct CreatePlanRequest {
    pub app_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub billing: BillingCycle,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percentage: f64,
    pub max_users: i32,
    #[serde(default)]
    pub features: Vec<Uuid>,
}

fn validate_create_plan(req: &CreatePlanRequest) -> Result<(), ValidationError> {
    check_max_users(Some(req.max_users))
}

impl CreateForm for CreatePlanRequest {
    type Entity = Plan;

    fn into_entity(self) -> AppDeskResult<Plan> {
        Ok(Plan {
            id: Uuid::new_v4(),
            app_id: self.app_id,
            name: self.name,
            price: self.price,
            billing: self.billing,
            currency: self.currency,
            discount_percentage: self.discount_percentage,
            max_users: self.max_users,
            features: self.features,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update_plan"))]
pub struct UpdatePlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<BillingCycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_users: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Uuid>>,
}

fn validate_update_plan(req: &UpdatePlanRequest) -> Result<(), ValidationError> {
    check_max_users(req.max_users)
}

impl UpdateForm for UpdatePlanRequest {
    type Entity = Plan;
}

// ─── Subscriptions ─────────────────────────────────────────────────────────

/// Subscribe a customer to a plan. `features` are the ids ticked on the
/// form; the repository prices them through a quote.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    #[serde(default)]
    pub features: Vec<Uuid>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub custom_discount_percent: f64,
    #[serde(default = "default_subscription_status")]
    pub status: SubscriptionStatus,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSubscriptionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateForm for UpdateSubscriptionRequest {
    type Entity = Subscription;
}

// ─── Payments ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub customer_id: Uuid,
    pub subscription_id: Uuid,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[serde(default = "default_payment_status")]
    pub status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

impl CreateForm for CreatePaymentRequest {
    type Entity = Payment;

    fn into_entity(self) -> AppDeskResult<Payment> {
        Ok(Payment {
            id: Uuid::new_v4(),
            customer_id: self.customer_id,
            subscription_id: self.subscription_id,
            amount: self.amount,
            status: self.status,
            payment_date: self.payment_date.unwrap_or_else(Utc::now),
            payment_method: self.payment_method,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<Option<String>>,
}

impl UpdateForm for UpdatePaymentRequest {
    type Entity = Payment;
}

// ─── Tickets ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub customer_id: Uuid,
    pub app_id: Option<Uuid>,
    pub category_id: Uuid,
    pub priority_id: Uuid,
    pub status_id: Uuid,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateForm for CreateTicketRequest {
    type Entity = Ticket;

    fn into_entity(self) -> AppDeskResult<Ticket> {
        Ok(Ticket {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            customer_id: self.customer_id,
            app_id: self.app_id,
            category_id: self.category_id,
            priority_id: self.priority_id,
            status_id: self.status_id,
            assigned_to: self.assigned_to,
            due_date: self.due_date,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<Option<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<Uuid>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateForm for UpdateTicketRequest {
    type Entity = Ticket;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_request(max_users: i32, discount: f64) -> CreatePlanRequest {
        CreatePlanRequest {
            app_id: Uuid::new_v4(),
            name: "Team".into(),
            price: 49.0,
            billing: BillingCycle::Monthly,
            currency: "USD".into(),
            discount_percentage: discount,
            max_users,
            features: vec![],
        }
    }

    fn feature_request(metadata: Option<&str>) -> CreateFeatureRequest {
        CreateFeatureRequest {
            app_id: Uuid::new_v4(),
            name: "SSO".into(),
            description: None,
            feature_type: "addon".into(),
            base_price: 20.0,
            status: FeatureStatus::Active,
            is_default: false,
            feature_code: Some("SSO".into()),
            metadata: metadata.map(String::from),
        }
    }

    #[test]
    fn plan_user_limit_accepts_sentinel_or_positive() {
        assert!(plan_request(UNLIMITED_USERS, 0.0).validate().is_ok());
        assert!(plan_request(1, 0.0).validate().is_ok());
        assert!(plan_request(0, 0.0).validate().is_err());
        assert!(plan_request(-5, 0.0).validate().is_err());
    }

    #[test]
    fn plan_discount_must_be_a_percentage() {
        assert!(plan_request(10, 100.0).validate().is_ok());
        assert!(plan_request(10, 100.5).validate().is_err());
        assert!(plan_request(10, -1.0).validate().is_err());
    }

    #[test]
    fn validation_errors_convert_to_app_error() {
        let err: AppDeskError = plan_request(0, 0.0).validate().unwrap_err().into();
        match err {
            AppDeskError::Validation(message) => assert!(message.contains("max_users")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn customer_email_is_checked() {
        let mut req = CreateCustomerRequest {
            company: "Acme".into(),
            name: "Ada".into(),
            email: "not-an-email".into(),
            phone: None,
            status: CustomerStatus::Active,
        };
        assert!(req.validate().is_err());
        req.email = "ada@acme.io".into();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut req = feature_request(None);
        req.name = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn feature_metadata_must_be_an_object() {
        assert!(feature_request(None).validate().is_ok());
        assert!(feature_request(Some("  ")).validate().is_ok());
        assert!(feature_request(Some(r#"{"tier": "gold"}"#)).validate().is_ok());
        assert!(feature_request(Some("[1, 2]")).validate().is_err());
        assert!(feature_request(Some("{broken")).validate().is_err());

        let feature = feature_request(Some(r#"{"tier": "gold"}"#)).into_entity().unwrap();
        assert_eq!(feature.metadata, Some(json!({ "tier": "gold" })));
    }

    #[test]
    fn update_patch_only_carries_set_fields() {
        let req = UpdatePlanRequest {
            price: Some(59.0),
            max_users: Some(UNLIMITED_USERS),
            ..UpdatePlanRequest::default()
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.patch().unwrap(), json!({ "price": 59.0, "max_users": -1 }));
    }

    #[test]
    fn nullable_fields_can_be_cleared() {
        let req = UpdateTicketRequest {
            app_id: Some(None),
            assigned_to: Some(Some("sam".into())),
            ..UpdateTicketRequest::default()
        };
        assert_eq!(
            req.patch().unwrap(),
            json!({ "app_id": null, "assigned_to": "sam" })
        );

        let cleared: UpdateSubscriptionRequest =
            serde_json::from_value(json!({ "end_date": null })).unwrap();
        assert_eq!(cleared.end_date, Some(None));
        assert_eq!(cleared.patch().unwrap(), json!({ "end_date": null }));

        let untouched: UpdateSubscriptionRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.end_date, None);
        assert_eq!(untouched.patch().unwrap(), json!({}));
    }

    #[test]
    fn cleared_endpoint_skips_url_check() {
        let mut req = UpdateAppRequest {
            api_endpoint: Some(None),
            ..UpdateAppRequest::default()
        };
        assert!(req.validate().is_ok());
        req.api_endpoint = Some(Some("not a url".into()));
        assert!(req.validate().is_err());
    }

    #[test]
    fn feature_patch_embeds_parsed_metadata() {
        let req = UpdateFeatureRequest {
            base_price: Some(5.0),
            metadata: Some(r#"{"limit": 10}"#.into()),
            ..UpdateFeatureRequest::default()
        };
        assert_eq!(
            req.patch().unwrap(),
            json!({ "base_price": 5.0, "metadata": { "limit": 10 } })
        );
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let req = CreatePaymentRequest {
            customer_id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            amount: -10.0,
            status: PaymentStatus::Completed,
            payment_date: None,
            payment_method: None,
        };
        assert!(req.validate().is_err());
    }
}
