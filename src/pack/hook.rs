//! Timing wrapper around units of pack work.

use std::io::{Write, stdout};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::debug;

/// Records how long each wrapped unit takes.
///
/// Shared by reference across pool workers; the counters are atomics so
/// wrapping never contends on a lock.
#[derive(Debug, Default)]
pub struct SyncHook {
    units: AtomicUsize,
    total_micros: AtomicU64,
}

impl SyncHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` on the calling thread and return its result untouched.
    pub fn wrap<T>(&self, label: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.units.fetch_add(1, Ordering::Relaxed);
        self.total_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        debug!("pack"; "{} in {:?}", label, elapsed);
        result
    }

    pub fn units(&self) -> usize {
        self.units.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Duration {
        Duration::from_micros(self.total_micros.load(Ordering::Relaxed))
    }

    /// Flush pending output and log a summary of everything wrapped so far.
    pub fn close(&self) {
        stdout().flush().ok();
        debug!("pack"; "{} units, {:?} total", self.units(), self.total());
    }
}
