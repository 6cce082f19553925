//! Typed, cached access to the data store.
//!
//! Reads are served from a per-entity [`EntityCache`] while it is fresh.
//! Every write goes to the store first and then invalidates the cache of the
//! entity it touched, so the next read refetches.

use appdesk_billing::SubscriptionQuote;
use appdesk_cache::EntityCache;
use appdesk_core::config::{CacheConfig, ReportingConfig};
use appdesk_core::types::{
    App, Customer, Entity, Feature, Payment, Plan, Subscription, Table, Ticket, TicketCategory,
    TicketPriority, TicketStatus,
};
use appdesk_core::{AppDeskError, AppDeskResult};
use appdesk_reporting::{DashboardInput, DashboardOverview};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::forms::{CreateForm, CreateSubscriptionRequest, UpdateForm};
use crate::query::Query;
use crate::rows::{
    self, FeatureRow, PaymentRow, PlanRow, SubscriptionRow, TicketLookups, TicketRow,
};
use crate::store::DataStore;

/// One cache per table.
pub struct Caches {
    apps: EntityCache<App>,
    customers: EntityCache<Customer>,
    features: EntityCache<Feature>,
    plans: EntityCache<Plan>,
    subscriptions: EntityCache<Subscription>,
    payments: EntityCache<Payment>,
    tickets: EntityCache<Ticket>,
    ticket_categories: EntityCache<TicketCategory>,
    ticket_priorities: EntityCache<TicketPriority>,
    ticket_statuses: EntityCache<TicketStatus>,
}

impl Caches {
    fn new(config: &CacheConfig) -> Self {
        let (ttl, max) = (config.ttl_secs, config.max_entries);
        Self {
            apps: EntityCache::new(ttl, max),
            customers: EntityCache::new(ttl, max),
            features: EntityCache::new(ttl, max),
            plans: EntityCache::new(ttl, max),
            subscriptions: EntityCache::new(ttl, max),
            payments: EntityCache::new(ttl, max),
            tickets: EntityCache::new(ttl, max),
            ticket_categories: EntityCache::new(ttl, max),
            ticket_priorities: EntityCache::new(ttl, max),
            ticket_statuses: EntityCache::new(ttl, max),
        }
    }

    fn evict_expired(&self) -> usize {
        self.apps.evict_expired()
            + self.customers.evict_expired()
            + self.features.evict_expired()
            + self.plans.evict_expired()
            + self.subscriptions.evict_expired()
            + self.payments.evict_expired()
            + self.tickets.evict_expired()
            + self.ticket_categories.evict_expired()
            + self.ticket_priorities.evict_expired()
            + self.ticket_statuses.evict_expired()
    }
}

/// An entity the repository can cache, with the order its full list is
/// read in.
pub trait CachedEntity: Entity {
    fn cache(caches: &Caches) -> &EntityCache<Self>;

    fn list_query() -> Query;
}

macro_rules! cached {
    ($ty:ty, $field:ident, $order:literal, $ascending:literal) => {
        impl CachedEntity for $ty {
            fn cache(caches: &Caches) -> &EntityCache<Self> {
                &caches.$field
            }

            fn list_query() -> Query {
                Query::new().order($order, $ascending)
            }
        }
    };
}

cached!(App, apps, "created_at", false);
cached!(Customer, customers, "created_at", false);
cached!(Feature, features, "created_at", false);
cached!(Plan, plans, "created_at", false);
cached!(Subscription, subscriptions, "start_date", false);
cached!(Payment, payments, "payment_date", false);
cached!(Ticket, tickets, "created_at", false);
cached!(TicketCategory, ticket_categories, "name", true);
cached!(TicketPriority, ticket_priorities, "name", true);
cached!(TicketStatus, ticket_statuses, "name", true);

fn decode<T: Entity>(row: Value) -> AppDeskResult<T> {
    Ok(serde_json::from_value(row)?)
}

fn decode_all<T: Entity>(rows: Vec<Value>) -> AppDeskResult<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

fn record_write(table: Table, op: &'static str) {
    metrics::counter!("repository.write", "table" => table.as_str(), "op" => op).increment(1);
}

pub struct Repository<S> {
    store: S,
    caches: Caches,
}

impl<S: DataStore> Repository<S> {
    pub fn new(store: S, config: &CacheConfig) -> Self {
        Self {
            store,
            caches: Caches::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop expired rows from every cache. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.caches.evict_expired()
    }

    pub fn invalidate<T: CachedEntity>(&self) {
        T::cache(&self.caches).invalidate();
    }

    // ─── Generic reads ─────────────────────────────────────────────────────

    /// Full table, cached. A read that overlaps a write to the same table is
    /// returned but not cached.
    pub async fn list<T: CachedEntity>(&self) -> AppDeskResult<Vec<T>> {
        let cache = T::cache(&self.caches);
        if let Some(rows) = cache.list() {
            return Ok(rows);
        }
        let generation = cache.generation();
        let rows: Vec<T> = decode_all(self.store.select(T::TABLE, &T::list_query()).await?)?;
        cache.replace_all(generation, &rows);
        Ok(rows)
    }

    /// Filtered read straight from the store. Not cached.
    pub async fn list_where<T: CachedEntity>(&self, query: &Query) -> AppDeskResult<Vec<T>> {
        decode_all(self.store.select(T::TABLE, query).await?)
    }

    pub async fn get<T: CachedEntity>(&self, id: Uuid) -> AppDeskResult<T> {
        let cache = T::cache(&self.caches);
        if let Some(row) = cache.get(&id) {
            return Ok(row);
        }
        let generation = cache.generation();
        let query = Query::new().eq("id", id).limit(1);
        let row = self
            .store
            .select(T::TABLE, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppDeskError::not_found(T::NAME, id))?;
        let row: T = decode(row)?;
        cache.put(generation, row.clone());
        Ok(row)
    }

    // ─── Generic writes ────────────────────────────────────────────────────

    pub async fn insert<T: CachedEntity>(&self, entity: T) -> AppDeskResult<T> {
        let stored = self.store.insert(T::TABLE, serde_json::to_value(&entity)?).await?;
        self.invalidate::<T>();
        record_write(T::TABLE, "insert");
        let stored: T = decode(stored)?;
        info!(table = %T::TABLE, id = %stored.id(), "{} created", T::NAME);
        Ok(stored)
    }

    pub async fn update<T: CachedEntity>(&self, id: Uuid, patch: Value) -> AppDeskResult<T> {
        let stored = self.store.update(T::TABLE, id, patch).await?;
        self.invalidate::<T>();
        record_write(T::TABLE, "update");
        info!(table = %T::TABLE, id = %id, "{} updated", T::NAME);
        decode(stored)
    }

    pub async fn delete<T: CachedEntity>(&self, id: Uuid) -> AppDeskResult<()> {
        self.store.delete(T::TABLE, id).await?;
        self.invalidate::<T>();
        record_write(T::TABLE, "delete");
        info!(table = %T::TABLE, id = %id, "{} deleted", T::NAME);
        Ok(())
    }

    // ─── Forms ─────────────────────────────────────────────────────────────

    /// Validate `form` and insert the entity it describes.
    pub async fn create<F>(&self, form: F) -> AppDeskResult<F::Entity>
    where
        F: CreateForm,
        F::Entity: CachedEntity,
    {
        form.validate()?;
        self.insert(form.into_entity()?).await
    }

    /// Validate `form` and apply it to row `id`. An empty patch is a plain
    /// read.
    pub async fn apply<F>(&self, id: Uuid, form: &F) -> AppDeskResult<F::Entity>
    where
        F: UpdateForm,
        F::Entity: CachedEntity,
    {
        form.validate()?;
        let patch = form.patch()?;
        if patch.as_object().is_some_and(|fields| fields.is_empty()) {
            return self.get(id).await;
        }
        self.update(id, patch).await
    }

    // ─── Subscriptions ─────────────────────────────────────────────────────

    /// Price a subscribe form without writing anything.
    pub async fn quote_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> AppDeskResult<SubscriptionQuote> {
        request.validate()?;
        let plan: Plan = self.get(request.plan_id).await?;
        let features = self.features_for_app(plan.app_id).await?;
        Ok(SubscriptionQuote::build(
            &plan,
            &features,
            &request.features,
            request.custom_discount_percent,
        ))
    }

    /// Quote and insert a subscription. The customer must exist; selected
    /// features that are not eligible for the plan are left out.
    pub async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> AppDeskResult<Subscription> {
        let customer: Customer = self.get(request.customer_id).await?;
        let quote = self.quote_subscription(&request).await?;
        if !quote.skipped.is_empty() {
            warn!(
                customer_id = %customer.id,
                plan_id = %quote.plan_id,
                skipped = quote.skipped.len(),
                "Ineligible features left out of subscription"
            );
        }
        let start_date = request.start_date.unwrap_or_else(Utc::now);
        let subscription = quote.into_subscription(customer.id, request.status, start_date);
        self.insert(subscription).await
    }

    pub async fn features_for_app(&self, app_id: Uuid) -> AppDeskResult<Vec<Feature>> {
        let features: Vec<Feature> = self.list().await?;
        Ok(features.into_iter().filter(|f| f.app_id == app_id).collect())
    }

    pub async fn plans_for_app(&self, app_id: Uuid) -> AppDeskResult<Vec<Plan>> {
        let plans: Vec<Plan> = self.list().await?;
        Ok(plans.into_iter().filter(|p| p.app_id == app_id).collect())
    }

    pub async fn subscriptions_for_customer(&self, customer_id: Uuid) -> AppDeskResult<Vec<Subscription>> {
        let subscriptions: Vec<Subscription> = self.list().await?;
        Ok(subscriptions
            .into_iter()
            .filter(|s| s.customer_id == customer_id)
            .collect())
    }

    // ─── Joined rows ───────────────────────────────────────────────────────

    pub async fn subscription_rows(&self) -> AppDeskResult<Vec<SubscriptionRow>> {
        let (subscriptions, customers, apps, plans) = tokio::try_join!(
            self.list::<Subscription>(),
            self.list::<Customer>(),
            self.list::<App>(),
            self.list::<Plan>(),
        )?;
        Ok(rows::join_subscriptions(subscriptions, &customers, &apps, &plans))
    }

    pub async fn payment_rows(&self) -> AppDeskResult<Vec<PaymentRow>> {
        let (payments, customers) =
            tokio::try_join!(self.list::<Payment>(), self.list::<Customer>())?;
        Ok(rows::join_payments(payments, &customers))
    }

    pub async fn feature_rows(&self) -> AppDeskResult<Vec<FeatureRow>> {
        let (features, apps) = tokio::try_join!(self.list::<Feature>(), self.list::<App>())?;
        Ok(rows::join_features(features, &apps))
    }

    pub async fn plan_rows(&self) -> AppDeskResult<Vec<PlanRow>> {
        let (plans, apps) = tokio::try_join!(self.list::<Plan>(), self.list::<App>())?;
        Ok(rows::join_plans(plans, &apps))
    }

    pub async fn ticket_rows(&self) -> AppDeskResult<Vec<TicketRow>> {
        let (tickets, customers, apps, categories, priorities, statuses) = tokio::try_join!(
            self.list::<Ticket>(),
            self.list::<Customer>(),
            self.list::<App>(),
            self.list::<TicketCategory>(),
            self.list::<TicketPriority>(),
            self.list::<TicketStatus>(),
        )?;
        Ok(rows::join_tickets(
            tickets,
            &customers,
            &apps,
            TicketLookups {
                categories: &categories,
                priorities: &priorities,
                statuses: &statuses,
            },
        ))
    }

    // ─── Dashboard ─────────────────────────────────────────────────────────

    pub async fn dashboard(
        &self,
        options: &ReportingConfig,
        now: DateTime<Utc>,
    ) -> AppDeskResult<DashboardOverview> {
        let (apps, customers, plans, subscriptions, payments, tickets, statuses, priorities) = tokio::try_join!(
            self.list::<App>(),
            self.list::<Customer>(),
            self.list::<Plan>(),
            self.list::<Subscription>(),
            self.list::<Payment>(),
            self.list::<Ticket>(),
            self.list::<TicketStatus>(),
            self.list::<TicketPriority>(),
        )?;

        let input = DashboardInput {
            apps: &apps,
            customers: &customers,
            plans: &plans,
            subscriptions: &subscriptions,
            payments: &payments,
            tickets: &tickets,
            ticket_statuses: &statuses,
            ticket_priorities: &priorities,
        };
        Ok(DashboardOverview::build(&input, options, now))
    }
}
