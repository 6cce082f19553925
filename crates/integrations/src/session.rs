//! Lookup session for the feature form: tracks which app is selected and
//! drops responses that arrive after the selection moved on.

use std::sync::atomic::{AtomicU64, Ordering};

use appdesk_core::types::App;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::feature_codes::{FeatureCodeLookup, FeatureCodeSource, LookupOutcome};

/// One form's view of the feature-code lookup.
///
/// Every selection change bumps a generation counter. A response is only
/// delivered when both its generation and its app id still match.
pub struct LookupSession<S> {
    lookup: FeatureCodeLookup<S>,
    selected: Mutex<Option<Uuid>>,
    generation: AtomicU64,
}

impl<S: FeatureCodeSource> LookupSession<S> {
    pub fn new(lookup: FeatureCodeLookup<S>) -> Self {
        Self {
            lookup,
            selected: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Record a new selection (or `None` when the form is cleared) and
    /// return its generation.
    pub fn select_app(&self, app_id: Option<Uuid>) -> u64 {
        let mut selected = self.selected.lock();
        *selected = app_id;
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn selected_app(&self) -> Option<Uuid> {
        *self.selected.lock()
    }

    pub fn is_current(&self, generation: u64, app_id: Uuid) -> bool {
        let selected = self.selected.lock();
        self.generation.load(Ordering::SeqCst) == generation && *selected == Some(app_id)
    }

    /// Select `app` and look up its feature codes. Returns `None` when the
    /// selection changed while the request was in flight.
    pub async fn lookup(&self, app: &App) -> Option<LookupOutcome> {
        let generation = self.select_app(Some(app.id));
        let outcome = self.lookup.lookup(app).await;

        if self.is_current(generation, app.id) {
            Some(outcome)
        } else {
            debug!(app_id = %app.id, generation, "Discarding stale feature code response");
            None
        }
    }
}
