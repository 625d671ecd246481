//! Live user lookup.
//!
//! Keystrokes are debounced into one lookup per settled query. Each issued
//! lookup is tagged with a generation number and its response is applied
//! only if no newer lookup was issued (or the input cleared) in the
//! meantime, so a slow response for an old keystroke can never overwrite the
//! results of a newer one. In-flight requests are never aborted, only
//! ignored.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use roamly_shared::constants::{MIN_QUERY_CHARS, SEARCH_DEBOUNCE_MS, SEARCH_RESULT_LIMIT};
use roamly_shared::MatchRecord;

use crate::api::RemoteApi;
use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    PendingDebounce,
    RequestInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub limit: usize,
    pub min_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            limit: SEARCH_RESULT_LIMIT,
            min_chars: MIN_QUERY_CHARS,
        }
    }
}

impl From<&ClientConfig> for SearchSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            debounce: config.search_debounce,
            limit: config.search_limit,
            ..Self::default()
        }
    }
}

struct QueryState {
    raw_input: String,
    /// Debounce task that has not fired yet.
    pending: Option<JoinHandle<()>>,
    /// Identifies the most recent debounce task; older ones exit on wake.
    ticket: u64,
    /// Bumped for every issued lookup and whenever the input is cleared.
    generation: u64,
    phase: SearchPhase,
}

struct Shared {
    api: Arc<dyn RemoteApi>,
    settings: SearchSettings,
    state: Mutex<QueryState>,
    results: watch::Sender<Vec<MatchRecord>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueryState> {
        // No invariant spans a panic point, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn debounce_then_lookup(self: Arc<Self>, ticket: u64) {
        tokio::time::sleep(self.settings.debounce).await;

        let (generation, query) = {
            let mut state = self.lock();
            if state.ticket != ticket {
                return;
            }
            state.pending = None;
            state.generation += 1;
            state.phase = SearchPhase::RequestInFlight;
            (state.generation, state.raw_input.clone())
        };

        debug!(generation, "Issuing user lookup");
        let matches = match self.api.search_users(&query, self.settings.limit).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(generation, error = %e, "User lookup failed, showing no results");
                Vec::new()
            }
        };

        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                generation,
                current = state.generation,
                "Discarding superseded lookup response"
            );
            return;
        }
        if state.pending.is_none() {
            state.phase = SearchPhase::Idle;
        }
        debug!(generation, count = matches.len(), "Applying lookup results");
        self.results.send_replace(matches);
    }
}

/// Debounced, generation-checked user search.
///
/// Cheap to clone; clones drive the same query state. Must be used from
/// within a tokio runtime.
#[derive(Clone)]
pub struct SearchCoordinator {
    shared: Arc<Shared>,
}

impl SearchCoordinator {
    pub fn new(api: Arc<dyn RemoteApi>, settings: SearchSettings) -> Self {
        let (results, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared {
                api,
                settings,
                state: Mutex::new(QueryState {
                    raw_input: String::new(),
                    pending: None,
                    ticket: 0,
                    generation: 0,
                    phase: SearchPhase::Idle,
                }),
                results,
            }),
        }
    }

    /// Record a keystroke.
    ///
    /// Restarts the quiet interval. Input shorter than the minimum clears the
    /// results immediately and supersedes any lookup still in flight.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.shared.lock();

        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.ticket += 1;
        let too_short = text.chars().count() < self.shared.settings.min_chars;
        state.raw_input = text;

        if too_short {
            state.generation += 1;
            state.phase = SearchPhase::Idle;
            self.shared.results.send_replace(Vec::new());
            return;
        }

        state.phase = SearchPhase::PendingDebounce;
        let ticket = state.ticket;
        let shared = Arc::clone(&self.shared);
        state.pending = Some(tokio::spawn(shared.debounce_then_lookup(ticket)));
    }

    pub fn query(&self) -> String {
        self.shared.lock().raw_input.clone()
    }

    pub fn phase(&self) -> SearchPhase {
        self.shared.lock().phase
    }

    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// Last accepted result set.
    pub fn results(&self) -> Vec<MatchRecord> {
        self.shared.results.borrow().clone()
    }

    /// Receiver notified every time the result set is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Vec<MatchRecord>> {
        self.shared.results.subscribe()
    }
}
