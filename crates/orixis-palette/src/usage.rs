//! Usage state shared by every palette instance: recents, favorites and
//! execution counts.
//!
//! The state is loaded once when the [`RegistryService`](crate::registry::RegistryService)
//! starts and written back in full after each mutation. Persistence is best
//! effort: a failing store is logged and otherwise ignored, and the in-memory
//! copy stays authoritative for the session.

use crate::error::StoreError;
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Store key for the favorite ids.
pub const FAVORITES_KEY: &str = "orixis.palette.favorites";
/// Store key for the recent ids.
pub const RECENTS_KEY: &str = "orixis.palette.recents";
/// Store key for the execution counts.
pub const FREQUENCY_KEY: &str = "orixis.palette.frequency";
/// Maximum number of recent ids kept.
pub const MAX_RECENTS: usize = 10;

/// Handle shared between instances. The mutex serializes the
/// read-modify-write of each mutation, including the store flush.
pub type SharedUsage = Arc<Mutex<UsageStore>>;

/// Lock shared usage state. A poisoned lock is recovered: the data is plain
/// collections and stays consistent between mutations.
pub fn lock(usage: &SharedUsage) -> MutexGuard<'_, UsageStore> {
    usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Recents, favorites and frequency, plus the store they persist to.
pub struct UsageStore {
    store: Box<dyn KeyValueStore>,
    recents: Vec<String>,
    favorites: BTreeSet<String>,
    frequency: BTreeMap<String, u64>,
}

impl std::fmt::Debug for UsageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageStore")
            .field("recents", &self.recents)
            .field("favorites", &self.favorites)
            .field("frequency", &self.frequency)
            .finish_non_exhaustive()
    }
}

impl UsageStore {
    /// Load the three records from `store`. Missing or unreadable records
    /// start empty.
    pub fn load(store: impl KeyValueStore) -> Self {
        let store: Box<dyn KeyValueStore> = Box::new(store);
        let mut recents: Vec<String> = read_record(store.as_ref(), RECENTS_KEY);
        let favorites: BTreeSet<String> = read_record(store.as_ref(), FAVORITES_KEY);
        let frequency = read_record(store.as_ref(), FREQUENCY_KEY);

        let mut seen = BTreeSet::new();
        recents.retain(|id| seen.insert(id.clone()));
        recents.truncate(MAX_RECENTS);

        tracing::debug!(
            recents = recents.len(),
            favorites = favorites.len(),
            "loaded palette usage"
        );
        Self {
            store,
            recents,
            favorites,
            frequency,
        }
    }

    /// Wrap in the shared handle.
    pub fn shared(self) -> SharedUsage {
        Arc::new(Mutex::new(self))
    }

    /// Recent ids, most recent first.
    pub fn recent(&self) -> &[String] {
        &self.recents
    }

    /// Position of `id` in the recents list (0 = most recent).
    pub fn recency_rank(&self, id: &str) -> Option<usize> {
        self.recents.iter().position(|r| r == id)
    }

    /// Whether `id` is a favorite.
    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.contains(id)
    }

    /// All favorite ids.
    pub fn favorites(&self) -> &BTreeSet<String> {
        &self.favorites
    }

    /// How many times `id` has been executed.
    pub fn frequency(&self, id: &str) -> u64 {
        self.frequency.get(id).copied().unwrap_or(0)
    }

    /// Flip favorite membership and persist. Returns the new state.
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let now_favorite = if self.favorites.remove(id) {
            false
        } else {
            self.favorites.insert(id.to_string());
            true
        };
        tracing::debug!(id, favorite = now_favorite, "toggled favorite");
        self.persist();
        now_favorite
    }

    /// Move `id` to the front of the recents, bump its count, and persist.
    pub fn record_execution(&mut self, id: &str) {
        self.recents.retain(|r| r != id);
        self.recents.insert(0, id.to_string());
        self.recents.truncate(MAX_RECENTS);
        let count = self.frequency.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        self.persist();
    }

    fn persist(&mut self) {
        write_record(self.store.as_mut(), FAVORITES_KEY, &self.favorites);
        write_record(self.store.as_mut(), RECENTS_KEY, &self.recents);
        write_record(self.store.as_mut(), FREQUENCY_KEY, &self.frequency);
    }
}

fn read_record<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let text = match store.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return T::default(),
        Err(err) => {
            tracing::warn!(key, %err, "could not read palette usage, starting empty");
            return T::default();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|err| {
        tracing::warn!(key, %err, "discarding unreadable palette usage record");
        T::default()
    })
}

fn write_record<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|text| store.set(key, &text));
    if let Err(err) = result {
        tracing::warn!(key, %err, "could not persist palette usage");
    }
}
