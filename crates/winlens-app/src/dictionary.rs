// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::{DataSource, EventDictionary, FetchError};

/// Lazily fetched, shared event dictionary.
///
/// The first `get` fetches; callers arriving while that fetch is in flight
/// block until it settles and share its outcome. A failure leaves the cache
/// empty so the next `get` tries again. Once populated the dictionary is
/// never refetched or replaced.
#[derive(Debug, Default)]
pub struct EventDictionaryCache {
    inner: Mutex<CacheInner>,
    settled: Condvar,
}

#[derive(Debug, Default)]
struct CacheInner {
    slot: Slot,
    attempts: u64,
    last_failure: Option<(u64, FetchError)>,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Fetching {
        attempt: u64,
    },
    Ready(Arc<EventDictionary>),
}

impl EventDictionaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<S>(&self, source: &S) -> Result<Arc<EventDictionary>, FetchError>
    where
        S: DataSource + ?Sized,
    {
        let mut inner = self.lock();
        let attempt = loop {
            let in_flight = match &inner.slot {
                Slot::Ready(dictionary) => return Ok(Arc::clone(dictionary)),
                Slot::Fetching { attempt } => Some(*attempt),
                Slot::Empty => None,
            };

            let Some(in_flight) = in_flight else {
                inner.attempts = inner.attempts.saturating_add(1);
                let attempt = inner.attempts;
                inner.slot = Slot::Fetching { attempt };
                break attempt;
            };

            inner = self
                .settled
                .wait_while(inner, |inner| {
                    matches!(inner.slot, Slot::Fetching { attempt } if attempt == in_flight)
                })
                .unwrap_or_else(PoisonError::into_inner);
            if let Some((failed, error)) = &inner.last_failure
                && *failed == in_flight
            {
                return Err(error.clone());
            }
        };
        drop(inner);

        debug!(attempt, "fetching event dictionary");
        let mut guard = FetchGuard {
            cache: self,
            attempt,
            settled: false,
        };
        let outcome = source.fetch_event_dictionary();
        guard.settle(outcome)
    }

    /// The dictionary if a previous `get` already populated it.
    pub fn peek(&self) -> Option<Arc<EventDictionary>> {
        match &self.lock().slot {
            Slot::Ready(dictionary) => Some(Arc::clone(dictionary)),
            Slot::Empty | Slot::Fetching { .. } => None,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.peek().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets the slot if the fetch unwinds, so waiters are never stranded.
struct FetchGuard<'a> {
    cache: &'a EventDictionaryCache,
    attempt: u64,
    settled: bool,
}

impl FetchGuard<'_> {
    fn settle(
        &mut self,
        outcome: Result<EventDictionary, FetchError>,
    ) -> Result<Arc<EventDictionary>, FetchError> {
        self.settled = true;
        let mut inner = self.cache.lock();
        let result = match outcome {
            Ok(dictionary) => {
                let dictionary = Arc::new(dictionary);
                debug!(entries = dictionary.len(), "event dictionary ready");
                inner.slot = Slot::Ready(Arc::clone(&dictionary));
                inner.last_failure = None;
                Ok(dictionary)
            }
            Err(error) => {
                warn!(attempt = self.attempt, %error, "event dictionary fetch failed");
                inner.slot = Slot::Empty;
                inner.last_failure = Some((self.attempt, error.clone()));
                Err(error)
            }
        };
        drop(inner);
        self.cache.settled.notify_all();
        result
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = self.cache.lock();
        inner.slot = Slot::Empty;
        inner.last_failure = Some((
            self.attempt,
            FetchError::network("event dictionary fetch aborted"),
        ));
        drop(inner);
        self.cache.settled.notify_all();
    }
}
