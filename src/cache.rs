//! Short-lived storage for reports between display and download.
//!
//! A report is stored under an opaque token when it is first rendered and
//! fetched again by a later, independent download request. Entries older than
//! the configured TTL are treated as gone. Nothing survives a restart.

use crate::config::CacheConfig;
use crate::error::{Result, SalesReportError};
use crate::schema::ReportBundle;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Monotonic time source for entry ages.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}

/// Token-keyed report storage shared by independent request flows.
///
/// Implementations must make `put`, `get` and `sweep` mutually consistent
/// under concurrent use.
pub trait ReportStore: Send + Sync {
    /// Stores `bundle` under a fresh, unguessable token and returns the token.
    fn put(&self, bundle: ReportBundle) -> String;

    /// Returns the bundle for `token`, or [`SalesReportError::ReportNotFound`]
    /// when the token is unknown or its entry has outlived the TTL.
    fn get(&self, token: &str) -> Result<Arc<ReportBundle>>;

    /// Removes every expired entry and returns how many were removed.
    fn sweep(&self) -> usize;
}

struct CacheEntry {
    bundle: Arc<ReportBundle>,
    inserted_at: Instant,
}

/// In-process [`ReportStore`] guarded by a single mutex.
pub struct ReportCache<C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: C,
}

impl ReportCache<SystemClock> {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for ReportCache<SystemClock> {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl<C: Clock> ReportCache<C> {
    pub fn with_clock(config: &CacheConfig, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: config.ttl(),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) > self.ttl
    }
}

impl<C: Clock> ReportStore for ReportCache<C> {
    fn put(&self, bundle: ReportBundle) -> String {
        let token = Uuid::new_v4().to_string();
        let entry = CacheEntry {
            bundle: Arc::new(bundle),
            inserted_at: self.clock.now(),
        };

        let mut entries = self.entries.lock();
        entries.insert(token.clone(), entry);
        debug!("Cached report {} ({} entries held)", token, entries.len());

        token
    }

    fn get(&self, token: &str) -> Result<Arc<ReportBundle>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(token) {
            Some(entry) if !self.is_expired(entry, now) => {
                return Ok(Arc::clone(&entry.bundle));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.remove(token);
            debug!("Report {} expired", token);
        }

        warn!("Report token not found or expired: {}", token);
        Err(SalesReportError::ReportNotFound {
            token: token.to_string(),
        })
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - entries.len();

        if removed > 0 {
            debug!("Swept {} expired report(s), {} remain", removed, entries.len());
        }
        removed
    }
}
