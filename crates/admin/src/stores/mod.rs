//! Per-resource state stores.
//!
//! A store wraps one backend API with the state a page renders from:
//! the list, the currently selected item, a loading flag and the last
//! error message. Every operation records its outcome in that state and
//! also hands the result back to the caller.
//!
//! # Stale responses
//!
//! `fetch_all` and `fetch_by_id` each take a generation number before the
//! request goes out. When the response arrives, it is applied only if no
//! later fetch of the same kind has started since; otherwise it is dropped.
//!
//! # Locking
//!
//! The state mutex is only held to read or write state, never across a
//! backend call.

mod orders;
mod people;

pub use orders::{CancelOutcome, OrderStore, RefundOutcome};
pub use people::PersonStore;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;

use tmc_core::{Order, OrderId, Person, PersonId};

use crate::backend::ApiError;

/// Something the store can find in its list by id.
pub trait Keyed: Clone + Send + Sync {
    type Key: PartialEq + Copy + Send + Sync + std::fmt::Display;

    fn key(&self) -> Self::Key;
}

impl Keyed for Person {
    type Key = PersonId;

    fn key(&self) -> PersonId {
        self.id
    }
}

impl Keyed for Order {
    type Key = OrderId;

    fn key(&self) -> OrderId {
        self.id
    }
}

/// Snapshot of a store's state, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceState<T> {
    pub items: Vec<T>,
    pub current: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
        }
    }
}

struct StateInner<T> {
    items: Vec<T>,
    current: Option<T>,
    error: Option<String>,
}

/// Shared state machinery behind every store.
pub(crate) struct ResourceCore<T> {
    state: Mutex<StateInner<T>>,
    in_flight: AtomicUsize,
    list_generation: AtomicU64,
    item_generation: AtomicU64,
}

/// Marks one operation as in flight until dropped.
pub(crate) struct InFlight<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T: Keyed> ResourceCore<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(StateInner {
                items: Vec::new(),
                current: None,
                error: None,
            }),
            in_flight: AtomicUsize::new(0),
            list_generation: AtomicU64::new(0),
            item_generation: AtomicU64::new(0),
        }
    }

    pub(crate) fn begin(&self) -> InFlight<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlight {
            counter: &self.in_flight,
        }
    }

    pub(crate) async fn snapshot(&self) -> ResourceState<T> {
        let state = self.state.lock().await;
        ResourceState {
            items: state.items.clone(),
            current: state.current.clone(),
            loading: self.in_flight.load(Ordering::SeqCst) > 0,
            error: state.error.clone(),
        }
    }

    pub(crate) fn next_list_generation(&self) -> u64 {
        self.list_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn next_item_generation(&self) -> u64 {
        self.item_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current_list(&self, generation: u64) -> bool {
        self.list_generation.load(Ordering::SeqCst) == generation
    }

    fn is_current_item(&self, generation: u64) -> bool {
        self.item_generation.load(Ordering::SeqCst) == generation
    }

    /// Apply a list response. Returns `false` if it was superseded.
    pub(crate) async fn apply_list(&self, generation: u64, result: &Result<Vec<T>, ApiError>) -> bool {
        let mut state = self.state.lock().await;
        if !self.is_current_list(generation) {
            tracing::debug!(generation, "Discarding superseded list response");
            return false;
        }
        match result {
            Ok(items) => {
                state.items.clone_from(items);
                state.error = None;
            }
            Err(e) => state.error = Some(e.user_message()),
        }
        true
    }

    /// Apply a single-item response. Returns `false` if it was superseded.
    pub(crate) async fn apply_item(&self, generation: u64, result: &Result<T, ApiError>) -> bool {
        let mut state = self.state.lock().await;
        if !self.is_current_item(generation) {
            tracing::debug!(generation, "Discarding superseded item response");
            return false;
        }
        match result {
            Ok(item) => {
                let key = item.key();
                if let Some(existing) = state.items.iter_mut().find(|i| i.key() == key) {
                    existing.clone_from(item);
                }
                state.current = Some(item.clone());
                state.error = None;
            }
            Err(e) => state.error = Some(e.user_message()),
        }
        true
    }

    pub(crate) async fn insert(&self, item: T) {
        let mut state = self.state.lock().await;
        state.items.push(item);
        state.error = None;
    }

    pub(crate) async fn replace(&self, item: T) {
        let mut state = self.state.lock().await;
        let key = item.key();
        if let Some(current) = state.current.as_mut().filter(|c| c.key() == key) {
            current.clone_from(&item);
        }
        if let Some(existing) = state.items.iter_mut().find(|i| i.key() == key) {
            *existing = item;
        }
        state.error = None;
    }

    pub(crate) async fn remove(&self, key: T::Key) {
        let mut state = self.state.lock().await;
        state.items.retain(|i| i.key() != key);
        if state.current.as_ref().is_some_and(|c| c.key() == key) {
            state.current = None;
        }
        state.error = None;
    }

    pub(crate) async fn current_key(&self) -> Option<T::Key> {
        self.state.lock().await.current.as_ref().map(Keyed::key)
    }

    pub(crate) async fn fail(&self, error: &ApiError) {
        tracing::warn!(error = %error, "Store operation failed");
        self.state.lock().await.error = Some(error.user_message());
    }

    pub(crate) async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }
}
