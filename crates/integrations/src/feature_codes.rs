//! Feature-code lookup: fetch the vendor's feature catalogue for an app.
//!
//! Missing credentials, transport errors, non-2xx responses, and unreadable
//! bodies all degrade to an empty list plus a [`LookupWarning`]. Feature
//! creation never waits on this succeeding.

use std::future::Future;
use std::time::Duration;

use appdesk_core::config::IntegrationsConfig;
use appdesk_core::types::App;
use appdesk_core::{AppDeskError, AppDeskResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// One entry of a vendor feature catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCode {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FeatureCatalogue {
    features: Vec<FeatureCode>,
}

/// Why a lookup came back empty.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupWarning {
    #[error("app {app_id} has no feature API endpoint or key configured")]
    NotConfigured { app_id: Uuid },

    #[error("invalid feature API endpoint: {reason}")]
    InvalidEndpoint { reason: String },

    #[error("feature API request failed: {reason}")]
    Transport { reason: String },

    #[error("feature API returned status {status}")]
    Status { status: u16 },

    #[error("feature API response could not be parsed: {reason}")]
    MalformedResponse { reason: String },
}

/// Result of one lookup. `codes` is empty whenever `warning` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub app_id: Uuid,
    pub codes: Vec<FeatureCode>,
    pub warning: Option<LookupWarning>,
}

impl LookupOutcome {
    fn degraded(app_id: Uuid, warning: LookupWarning) -> Self {
        Self {
            app_id,
            codes: Vec::new(),
            warning: Some(warning),
        }
    }
}

/// Where feature catalogues come from.
pub trait FeatureCodeSource: Send + Sync {
    fn fetch(
        &self,
        endpoint: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Vec<FeatureCode>, LookupWarning>> + Send;
}

/// `GET <endpoint>` with a bearer token, expecting
/// `{ "features": [ { "code": .., "name": .. } ] }`.
#[derive(Clone)]
pub struct HttpFeatureCodeSource {
    http: reqwest::Client,
}

impl HttpFeatureCodeSource {
    pub fn new(config: &IntegrationsConfig) -> AppDeskResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.lookup_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppDeskError::Http(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl FeatureCodeSource for HttpFeatureCodeSource {
    async fn fetch(&self, endpoint: &str, api_key: &str) -> Result<Vec<FeatureCode>, LookupWarning> {
        let url = url::Url::parse(endpoint).map_err(|e| LookupWarning::InvalidEndpoint {
            reason: e.to_string(),
        })?;

        let resp = self
            .http
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| LookupWarning::Transport {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(LookupWarning::Status {
                status: resp.status().as_u16(),
            });
        }

        let catalogue: FeatureCatalogue =
            resp.json().await.map_err(|e| LookupWarning::MalformedResponse {
                reason: e.to_string(),
            })?;
        Ok(catalogue.features)
    }
}

/// Applies the credential check and the degrade-to-empty policy on top of a
/// [`FeatureCodeSource`].
pub struct FeatureCodeLookup<S> {
    source: S,
}

impl<S: FeatureCodeSource> FeatureCodeLookup<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch the catalogue for `app`. Never fails; an app without both an
    /// endpoint and a key is answered without touching the network.
    pub async fn lookup(&self, app: &App) -> LookupOutcome {
        let credentials = non_blank(app.api_endpoint.as_deref()).zip(non_blank(app.api_key.as_deref()));
        let Some((endpoint, api_key)) = credentials else {
            debug!(app_id = %app.id, "Feature API not configured, skipping lookup");
            return LookupOutcome::degraded(app.id, LookupWarning::NotConfigured { app_id: app.id });
        };

        match self.source.fetch(endpoint, api_key).await {
            Ok(codes) => {
                debug!(app_id = %app.id, codes = codes.len(), "Feature codes fetched");
                LookupOutcome {
                    app_id: app.id,
                    codes,
                    warning: None,
                }
            }
            Err(warning) => {
                warn!(app_id = %app.id, warning = %warning, "Feature code lookup degraded to empty list");
                LookupOutcome::degraded(app.id, warning)
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appdesk_core::types::AppStatus;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl FeatureCodeSource for CountingSource {
        async fn fetch(&self, _: &str, _: &str) -> Result<Vec<FeatureCode>, LookupWarning> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![FeatureCode {
                code: "X".into(),
                name: "X".into(),
            }])
        }
    }

    fn app(endpoint: Option<&str>, key: Option<&str>) -> App {
        App {
            id: Uuid::new_v4(),
            name: "Helpdesk".into(),
            description: None,
            category: "support".into(),
            status: AppStatus::Active,
            revenue: 0.0,
            subscribers: 0,
            version: "2.1".into(),
            api_endpoint: endpoint.map(String::from),
            api_key: key.map(String::from),
            created_at: Utc::now(),
        }
    }

    async fn catalogue(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "Bearer secret");
        if !authorized {
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "features": [
                    { "code": "SSO", "name": "Single sign-on" },
                    { "code": "AUDIT", "name": "Audit log" }
                ]
            })),
        )
    }

    async fn garbage() -> &'static str {
        "not json"
    }

    async fn serve() -> String {
        let router = Router::new()
            .route("/features", get(catalogue))
            .route("/garbage", get(garbage));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn http_lookup() -> FeatureCodeLookup<HttpFeatureCodeSource> {
        FeatureCodeLookup::new(HttpFeatureCodeSource::new(&IntegrationsConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn missing_key_skips_network_call() {
        let lookup = FeatureCodeLookup::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let app = app(Some("https://vendor.example/features"), None);

        let outcome = lookup.lookup(&app).await;
        assert!(outcome.codes.is_empty());
        assert_eq!(outcome.warning, Some(LookupWarning::NotConfigured { app_id: app.id }));
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_endpoint_counts_as_missing() {
        let lookup = FeatureCodeLookup::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let outcome = lookup.lookup(&app(Some("   "), Some("secret"))).await;
        assert!(outcome.codes.is_empty());
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetches_catalogue_with_bearer_token() {
        let base = serve().await;
        let endpoint = format!("{base}/features");
        let outcome = http_lookup().lookup(&app(Some(&endpoint), Some("secret"))).await;

        assert_eq!(outcome.warning, None);
        let codes: Vec<_> = outcome.codes.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["SSO", "AUDIT"]);
    }

    #[tokio::test]
    async fn non_success_status_degrades() {
        let base = serve().await;
        let endpoint = format!("{base}/features");
        let outcome = http_lookup().lookup(&app(Some(&endpoint), Some("wrong"))).await;

        assert!(outcome.codes.is_empty());
        assert_eq!(outcome.warning, Some(LookupWarning::Status { status: 401 }));
    }

    #[tokio::test]
    async fn malformed_body_degrades() {
        let base = serve().await;
        let endpoint = format!("{base}/garbage");
        let outcome = http_lookup().lookup(&app(Some(&endpoint), Some("secret"))).await;

        assert!(outcome.codes.is_empty());
        assert!(matches!(
            outcome.warning,
            Some(LookupWarning::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = format!("http://{addr}/features");
        let outcome = http_lookup().lookup(&app(Some(&endpoint), Some("secret"))).await;

        assert!(outcome.codes.is_empty());
        assert!(matches!(outcome.warning, Some(LookupWarning::Transport { .. })));
    }

    #[tokio::test]
    async fn invalid_endpoint_degrades() {
        let outcome = http_lookup().lookup(&app(Some("not a url"), Some("secret"))).await;
        assert!(matches!(
            outcome.warning,
            Some(LookupWarning::InvalidEndpoint { .. })
        ));
    }
}
