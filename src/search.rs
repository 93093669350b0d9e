//! Background city search. Each query runs on its own thread; only the
//! response to the most recent query is kept.

use crate::geocode::{Candidate, CityLookup};
use anyhow::anyhow;
use log::{debug, error, info};
use std::{
    sync::{Arc, RwLock},
    thread::{self, JoinHandle},
};

/// Where the latest search is at
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Idle,
    Loading {
        query: String,
    },
    Found(Vec<Candidate>),
    NoResults,
    Failed,
}

impl SearchState {
    /// Status line for anything that isn't a result list
    pub fn status(&self) -> Option<&'static str> {
        match self {
            Self::Idle | Self::Found(_) => None,
            Self::Loading { .. } => Some("Searching..."),
            Self::NoResults => Some("No cities found."),
            Self::Failed => Some("Error searching."),
        }
    }
}

type Listener = Arc<dyn Fn(&SearchState) + Send + Sync>;

/// Single-flight wrapper around a [CityLookup]. Starting a new search
/// supersedes any in flight; stale responses are dropped on arrival.
pub struct CitySearch {
    lookup: Arc<dyn CityLookup>,
    inner: Arc<RwLock<Inner>>,
    listener: Listener,
}

#[derive(Default)]
struct Inner {
    /// Bumped on every new search
    generation: u64,
    state: SearchState,
}

impl CitySearch {
    /// The listener is called (from the search thread) whenever a search
    /// completes and its result is kept
    pub fn new(
        lookup: Arc<dyn CityLookup>,
        listener: impl 'static + Fn(&SearchState) + Send + Sync,
    ) -> Self {
        Self {
            lookup,
            inner: Default::default(),
            listener: Arc::new(listener),
        }
    }

    /// Latest kept state
    pub fn state(&self) -> SearchState {
        match self.inner.read() {
            Ok(inner) => inner.state.clone(),
            Err(err) => {
                error!("Search state lock poisoned: {err}");
                SearchState::Idle
            }
        }
    }

    /// Result at a position in the current result list
    pub fn candidate(&self, index: usize) -> Option<Candidate> {
        match self.state() {
            SearchState::Found(candidates) => candidates.get(index).cloned(),
            _ => None,
        }
    }

    /// Forget the current results, e.g. after one was picked. Any search in
    /// flight is abandoned too.
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.generation += 1;
            inner.state = SearchState::Idle;
        }
    }

    /// Kick off a search in the background. Blank queries are ignored.
    /// Returns the thread handle so callers (tests) can wait on it.
    pub fn start(&self, query: &str) -> anyhow::Result<Option<JoinHandle<()>>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let generation = {
            let mut inner = self.inner.write().map_err(|err| anyhow!("{err}"))?;
            inner.generation += 1;
            inner.state = SearchState::Loading {
                query: query.to_owned(),
            };
            inner.generation
        };

        let lookup = Arc::clone(&self.lookup);
        let inner = Arc::clone(&self.inner);
        let listener = Arc::clone(&self.listener);
        let query = query.to_owned();
        let handle = thread::spawn(move || {
            let state = match lookup.search(&query) {
                Ok(candidates) if candidates.is_empty() => SearchState::NoResults,
                Ok(candidates) => SearchState::Found(candidates),
                Err(err) => {
                    error!("Error searching for {query:?}: {err:?}");
                    SearchState::Failed
                }
            };

            let Ok(mut guard) = inner.write() else {
                error!("Search state lock poisoned, dropping results");
                return;
            };
            if guard.generation != generation {
                debug!("Discarding stale results for {query:?}");
                return;
            }
            info!("Search for {query:?} finished");
            guard.state = state.clone();
            // Release before notifying so the listener can read state
            drop(guard);
            listener(&state);
        });
        Ok(Some(handle))
    }
}
