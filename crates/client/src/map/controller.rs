use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use trailblazer_shared::geo::Coordinates;

use super::source::{Point, PointSource};
use crate::error::ApiError;

/// Initial camera: lower Manhattan at 50 km, the service's densest
/// coverage area.
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 40.7128,
    lon: -74.0060,
};
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// What the map UI should currently render. Always exactly one of these;
/// every controller operation ends in one of them.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// A fetch is in flight.
    Loading,
    /// The points to draw: the full result of the last fetch, or a locally
    /// filtered subset of it.
    Ready(Vec<Point>),
    /// The last fetch failed. The previous result set is retained
    /// internally for later filtering/reload but is no longer visible.
    Error(String),
}

/// The proximity query the controller most recently issued. Remembered so
/// clearing a filter can replay it without the caller re-specifying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityQuery {
    pub center: Coordinates,
    pub radius_km: f64,
}

struct Inner {
    /// Supersession counter: only the fetch holding the latest value may
    /// publish its outcome.
    generation: u64,
    /// Unfiltered result of the most recent successful fetch. Overwritten
    /// only by a successful fetch, never by filtering.
    all_points: Vec<Point>,
}

/// View-state controller for the proximity map. Loads nearby points with a
/// primary-then-secondary source fallback, filters the loaded set locally,
/// and lets at most one fetch's outcome win at a time.
///
/// One controller per active map view. Mutating calls are expected from a
/// single coordination context (the UI loop); the internal lock exists only
/// to bridge to the spawned fetch task, and `query` must run inside a Tokio
/// runtime. State transitions are published through a `watch` channel, so
/// subscribers always observe the most recent state, never a partial one.
pub struct ProximityController {
    source: Arc<dyn PointSource>,
    inner: Arc<Mutex<Inner>>,
    state: watch::Sender<ViewState>,
    last_query: ProximityQuery,
}

impl ProximityController {
    /// Starts in `Loading` with the default query. Nothing is fetched until
    /// the first `query`/`refresh` call.
    pub fn new(source: Arc<dyn PointSource>) -> Self {
        let (state, _) = watch::channel(ViewState::Loading);
        Self {
            source,
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                all_points: Vec::new(),
            })),
            state,
            last_query: ProximityQuery {
                center: DEFAULT_CENTER,
                radius_km: DEFAULT_RADIUS_KM,
            },
        }
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// The current state, cloned.
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn last_query(&self) -> ProximityQuery {
        self.last_query
    }

    /// Load points around `center`. Any in-flight fetch is superseded: its
    /// completion, successful or not, is discarded without touching state.
    pub fn query(&mut self, center: Coordinates, radius_km: f64) {
        self.last_query = ProximityQuery { center, radius_km };
        let generation = {
            let mut inner = self.lock_inner();
            inner.generation += 1;
            inner.generation
        };
        self.state.send_replace(ViewState::Loading);

        let source = Arc::clone(&self.source);
        let inner = Arc::clone(&self.inner);
        let state = self.state.clone();
        tokio::spawn(async move {
            let outcome = fetch_points(source.as_ref(), center, radius_km).await;
            let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.generation != generation {
                tracing::debug!(generation, "discarding superseded proximity fetch");
                return;
            }
            match outcome {
                Ok(points) => {
                    tracing::debug!(count = points.len(), "proximity fetch ready");
                    guard.all_points = points.clone();
                    state.send_replace(ViewState::Ready(points));
                }
                Err(err) => {
                    // Old cache survives a failed refresh.
                    tracing::warn!(error = %err, "proximity fetch failed");
                    state.send_replace(ViewState::Error(err.to_string()));
                }
            }
        });
    }

    /// Narrow the visible set to points whose name contains `text`,
    /// case-insensitively. Synchronous, no network; the unfiltered cache
    /// and the stored query are untouched. Blank text clears the filter
    /// instead (see `clear_filter`).
    pub fn filter(&mut self, text: &str) {
        if text.trim().is_empty() {
            self.clear_filter();
            return;
        }
        let needle = text.to_lowercase();
        let points: Vec<Point> = self
            .lock_inner()
            .all_points
            .iter()
            .filter(|point| point.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        self.state.send_replace(ViewState::Ready(points));
    }

    /// Live search-box entry point: blank input is a reset signal, anything
    /// else filters the loaded set locally.
    pub fn search(&mut self, text: &str) {
        self.filter(text);
    }

    /// Clearing a filter reloads from the network at the last known
    /// position, so the visible set reflects fresh server data rather than
    /// a cache re-display.
    pub fn clear_filter(&mut self) {
        self.refresh();
    }

    /// Re-issue the last query. Doubles as the retry affordance after
    /// `Error`.
    pub fn refresh(&mut self) {
        let ProximityQuery { center, radius_km } = self.last_query;
        self.query(center, radius_km);
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One logical proximity operation: both ranked sources are queried; a
/// non-empty primary set wins, otherwise the secondary set stands in
/// wholesale. The two are never merged, and either request failing fails
/// the operation.
async fn fetch_points(
    source: &dyn PointSource,
    center: Coordinates,
    radius_km: f64,
) -> Result<Vec<Point>, ApiError> {
    let (primary, secondary) = tokio::try_join!(
        source.primary(center, radius_km),
        source.secondary(center, radius_km)
    )?;
    if primary.is_empty() {
        Ok(secondary)
    } else {
        Ok(primary)
    }
}
