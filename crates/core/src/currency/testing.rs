//! In-memory rate source and controllable clock for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use travelfx_shared::CurrencyCode;

use super::clock::Clock;
use super::exchange::ExchangeRateTable;
use super::source::{RateSource, RateSourceError};

pub fn code(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).unwrap()
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Serves fixed tables. Unconfigured bases get an empty table.
#[derive(Default)]
pub struct StaticRateSource {
    tables: Mutex<HashMap<CurrencyCode, Vec<(CurrencyCode, Decimal)>>>,
    unsupported: Mutex<HashSet<CurrencyCode>>,
    failing: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticRateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rates(self, base: &str, rates: &[(&str, Decimal)]) -> Self {
        self.set_rates(base, rates);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_unsupported(self, base: &str) -> Self {
        self.unsupported.lock().unwrap().insert(code(base));
        self
    }

    pub fn set_rates(&self, base: &str, rates: &[(&str, Decimal)]) {
        let rates = rates.iter().map(|(c, r)| (code(c), *r)).collect();
        self.tables.lock().unwrap().insert(code(base), rates);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RateSource for StaticRateSource {
    fn fetch_rates(&self, base: CurrencyCode) -> Result<ExchangeRateTable, RateSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.unsupported.lock().unwrap().contains(&base) {
            return Err(RateSourceError::UnsupportedCurrency(base));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RateSourceError::Unavailable("connection refused".to_string()));
        }
        let rates = self
            .tables
            .lock()
            .unwrap()
            .get(&base)
            .cloned()
            .unwrap_or_default();
        ExchangeRateTable::new(base, rates, epoch())
            .map_err(|err| RateSourceError::Unavailable(err.to_string()))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(epoch()),
        }
    }

    pub fn advance(&self, by: chrono::TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
