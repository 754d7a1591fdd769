//! Idempotency ledger
//!
//! Tracks every idempotency key the executor has started work for, so a
//! side-effecting request is dispatched at most once. A key moves from
//! in-flight to either completed (with the cached result) or ambiguous (a
//! dispatch began and its outcome is unknown). Released keys are forgotten.

use crate::completion::Completion;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Ledger retention settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    /// How long a key is remembered after its last update
    pub retention: Duration,
    /// Soft cap on remembered keys
    pub max_entries: usize,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(3600),
            max_entries: 10_000,
        }
    }
}

/// What the ledger knows about a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// A request holding the key is running
    InFlight,
    /// The request finished and its result is cached
    Completed,
    /// A dispatch began but its outcome could not be established
    Ambiguous,
}

/// Result of claiming a key
#[derive(Debug, Clone)]
pub enum Claim {
    /// The caller now owns the key and may dispatch
    Acquired,
    /// The key already completed; here is the cached result
    Completed(Box<Completion>),
    /// Another request holds the key
    InFlight,
    /// An earlier attempt has an unknown outcome
    Ambiguous,
}

#[derive(Debug)]
enum Slot {
    InFlight,
    Completed(Box<Completion>),
    Ambiguous,
}

#[derive(Debug)]
struct LedgerEntry {
    slot: Slot,
    updated_at: Instant,
}

impl LedgerEntry {
    fn new(slot: Slot) -> Self {
        Self {
            slot,
            updated_at: Instant::now(),
        }
    }
}

/// Keyed record of side-effecting requests
#[derive(Debug, Default)]
pub struct IdempotencyLedger {
    config: IdempotencyConfig,
    entries: DashMap<String, LedgerEntry>,
}

impl IdempotencyLedger {
    /// Create a ledger
    #[must_use]
    pub fn new(config: IdempotencyConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
        }
    }

    /// Get the ledger configuration
    #[must_use]
    pub fn config(&self) -> IdempotencyConfig {
        self.config
    }

    fn expired(&self, entry: &LedgerEntry) -> bool {
        entry.updated_at.elapsed() >= self.config.retention
    }

    /// Atomically claim `key` for a new request
    pub fn claim(&self, key: &str) -> Claim {
        let claim = match self.entries.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(LedgerEntry::new(Slot::InFlight));
                Claim::Acquired
            }
            Entry::Occupied(mut occupied) => {
                if self.expired(occupied.get()) {
                    occupied.insert(LedgerEntry::new(Slot::InFlight));
                    Claim::Acquired
                } else {
                    match &occupied.get().slot {
                        Slot::InFlight => Claim::InFlight,
                        Slot::Completed(completion) => Claim::Completed(completion.clone()),
                        Slot::Ambiguous => Claim::Ambiguous,
                    }
                }
            }
        };

        if matches!(claim, Claim::Acquired) && self.entries.len() > self.config.max_entries {
            self.prune();
        }
        claim
    }

    /// Cache the result for `key`
    pub fn complete(&self, key: &str, completion: &Completion) {
        self.entries.insert(
            key.to_string(),
            LedgerEntry::new(Slot::Completed(Box::new(completion.clone()))),
        );
    }

    /// Record that `key`'s outcome is unknown
    pub fn mark_ambiguous(&self, key: &str) {
        debug!(idempotency_key = %key, "Marking idempotency key ambiguous");
        self.entries
            .insert(key.to_string(), LedgerEntry::new(Slot::Ambiguous));
    }

    /// Forget `key` (nothing was dispatched under it)
    pub fn release(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Current state of `key`, ignoring expired entries
    #[must_use]
    pub fn state(&self, key: &str) -> Option<KeyState> {
        let entry = self.entries.get(key)?;
        if self.expired(&entry) {
            return None;
        }
        Some(match entry.slot {
            Slot::InFlight => KeyState::InFlight,
            Slot::Completed(_) => KeyState::Completed,
            Slot::Ambiguous => KeyState::Ambiguous,
        })
    }

    /// Keys currently remembered, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired keys, then the oldest settled keys while over capacity
    ///
    /// In-flight keys are only dropped once expired.
    pub fn prune(&self) {
        self.entries.retain(|_, entry| !self.expired(entry));

        let excess = self.entries.len().saturating_sub(self.config.max_entries);
        if excess == 0 {
            return;
        }

        let mut settled: Vec<(String, Instant)> = self
            .entries
            .iter()
            .filter(|e| !matches!(e.slot, Slot::InFlight))
            .map(|e| (e.key().clone(), e.updated_at))
            .collect();
        settled.sort_by_key(|(_, at)| *at);

        for (key, _) in settled.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!(remaining = self.entries.len(), "Pruned idempotency ledger");
    }
}
