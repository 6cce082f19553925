//! Back-office analytics: revenue totals, status breakdowns, rankings,
//! monthly trends, and lifecycle estimators over already-fetched rows.
//!
//! Every function here is pure and total: empty input yields zero-valued
//! output, never an error or NaN.

pub mod capacity;
pub mod dashboard;
pub mod estimators;
pub mod ranking;
pub mod revenue;
pub mod status;

pub use dashboard::{DashboardInput, DashboardOverview};
pub use estimators::{average_lifetime_days, average_revenue_per_customer, churn_rate};
pub use ranking::top_n;
pub use revenue::{monthly_revenue, monthly_trend, mrr, total_revenue};
pub use status::{breakdown_by, count_by, status_breakdown};
