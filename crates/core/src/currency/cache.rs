//! Exchange rate table caching using Moka.
//!
//! One slot per base currency. A slot's mutex is held for the whole
//! check-fetch-store sequence, so concurrent readers of the same base wait on
//! the in-flight fetch instead of issuing their own. Refresh is lazy: only a
//! read of an expired or missing slot triggers a provider call.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use travelfx_shared::CurrencyCode;

use super::clock::{Clock, SystemClock};
use super::error::CurrencyError;
use super::exchange::ExchangeRateTable;
use super::source::{RateSource, RateSourceError};

/// A cached rate table and the instant it stops being fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCacheEntry {
    /// The cached table.
    pub table: ExchangeRateTable,
    /// Fresh strictly before this instant.
    pub expires_at: DateTime<Utc>,
}

/// Rates returned by the cache.
///
/// `stale` is set when the table is past its freshness window and was served
/// only because a refresh failed.
#[derive(Debug, Clone)]
pub struct CachedRates {
    entry: Arc<RateCacheEntry>,
    /// True when served past expiry after a failed refresh.
    pub stale: bool,
}

impl CachedRates {
    /// The rate table.
    #[must_use]
    pub fn table(&self) -> &ExchangeRateTable {
        &self.entry.table
    }

    /// When the table stops (or stopped) being fresh.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.entry.expires_at
    }
}

type Slot = Arc<Mutex<Option<Arc<RateCacheEntry>>>>;

/// Cache of exchange rate tables keyed by base currency.
///
/// Thread-safe; share it behind an `Arc`.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    clock: Arc<dyn Clock>,
    slots: Cache<CurrencyCode, Slot>,
}

impl RateCache {
    /// Creates an empty cache reading wall-clock time.
    #[must_use]
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    /// Creates an empty cache with a custom time source.
    #[must_use]
    pub fn with_clock(source: Arc<dyn RateSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            slots: Cache::builder().build(),
        }
    }

    /// Returns the rate table for `base`, fetching it if missing or expired.
    ///
    /// On a transient provider failure the last known table is returned with
    /// `stale = true`. An unsupported currency is never cached and never
    /// falls back.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::UnsupportedCurrency` if the provider rejects
    /// `base`, and `CurrencyError::RateSourceUnavailable` if the provider
    /// fails and nothing is cached.
    pub fn get_rates(
        &self,
        base: CurrencyCode,
        max_age: Duration,
    ) -> Result<CachedRates, CurrencyError> {
        let slot = self.slot(base);
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = current.as_ref() {
            if self.clock.now() < entry.expires_at {
                debug!(%base, expires_at = %entry.expires_at, "Rate cache hit");
                return Ok(CachedRates {
                    entry: Arc::clone(entry),
                    stale: false,
                });
            }
        }

        debug!(%base, cached = current.is_some(), "Rate cache miss, fetching");

        let fetched = self.source.fetch_rates(base).and_then(|table| {
            if table.base_currency() == base {
                Ok(table)
            } else {
                Err(RateSourceError::Unavailable(format!(
                    "requested {base} rates, provider answered with {}",
                    table.base_currency()
                )))
            }
        });

        match fetched {
            Ok(table) => {
                let expires_at = expiry(self.clock.now(), max_age);
                info!(%base, rates = table.len(), %expires_at, "Rate table refreshed");
                let entry = Arc::new(RateCacheEntry { table, expires_at });
                *current = Some(Arc::clone(&entry));
                Ok(CachedRates {
                    entry,
                    stale: false,
                })
            }
            Err(RateSourceError::UnsupportedCurrency(code)) => {
                warn!(%base, "Rate source does not support currency");
                Err(CurrencyError::UnsupportedCurrency(code))
            }
            Err(RateSourceError::Unavailable(reason)) => match current.as_ref() {
                Some(entry) => {
                    warn!(
                        %base,
                        %reason,
                        fetched_at = %entry.table.fetched_at(),
                        "Rate refresh failed, serving stale table"
                    );
                    Ok(CachedRates {
                        entry: Arc::clone(entry),
                        stale: true,
                    })
                }
                None => {
                    warn!(%base, %reason, "Rate refresh failed with nothing cached");
                    Err(CurrencyError::RateSourceUnavailable { base, reason })
                }
            },
        }
    }

    /// Returns the cached table for `base` without contacting the provider.
    ///
    /// `stale` reports whether the entry is past its freshness window.
    #[must_use]
    pub fn peek(&self, base: CurrencyCode) -> Option<CachedRates> {
        let slot = self.slots.get(&base)?;
        let current = slot.lock().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|entry| CachedRates {
            entry: Arc::clone(entry),
            stale: self.clock.now() >= entry.expires_at,
        })
    }

    /// Snapshot of every cached entry, ordered by base currency.
    #[must_use]
    pub fn entries(&self) -> Vec<RateCacheEntry> {
        let mut entries: Vec<RateCacheEntry> = self
            .slots
            .iter()
            .filter_map(|(_, slot)| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_deref()
                    .cloned()
            })
            .collect();
        entries.sort_by_key(|entry| entry.table.base_currency());
        entries
    }

    /// Seeds the cache with previously saved entries.
    ///
    /// An entry only replaces a cached one with an older fetch time. Entries
    /// keep their original expiry, so expired ones only serve as fallback.
    pub fn restore(&self, entries: impl IntoIterator<Item = RateCacheEntry>) {
        for entry in entries {
            let base = entry.table.base_currency();
            let slot = self.slot(base);
            let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
            let newer = current
                .as_ref()
                .is_none_or(|existing| existing.table.fetched_at() < entry.table.fetched_at());
            if newer {
                debug!(%base, expires_at = %entry.expires_at, "Restored cached rate table");
                *current = Some(Arc::new(entry));
            }
        }
    }

    /// Drops the cached table for `base`.
    pub fn invalidate(&self, base: CurrencyCode) {
        if let Some(slot) = self.slots.get(&base) {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    /// Drops every cached table.
    pub fn invalidate_all(&self) {
        for (_, slot) in self.slots.iter() {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    fn slot(&self, base: CurrencyCode) -> Slot {
        self.slots.get_with(base, || Arc::new(Mutex::new(None)))
    }
}

fn expiry(now: DateTime<Utc>, max_age: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(max_age)
        .ok()
        .and_then(|age| now.checked_add_signed(age))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
