use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::compare::{check_pair, compare, ComparisonReport};
use crate::config::AnalyticsConfig;
use crate::data::source::SampleSource;
use crate::error::CompareError;

/// Identifies one comparison run. Only the most recently issued token may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken(u64);

impl RunToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Holds the latest successful comparison for export consumers.
///
/// Each run takes a token before retrieval starts. A run that completes
/// after a newer one was started is dropped instead of overwriting the
/// newer state, and failed runs leave the previous report in place.
#[derive(Debug, Default)]
pub struct ComparisonSession {
    generation: AtomicU64,
    latest: Mutex<Option<Arc<ComparisonReport>>>,
}

impl ComparisonSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run, superseding any run still in flight.
    pub fn begin(&self) -> RunToken {
        RunToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RunToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<ComparisonReport>>> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `report` if `token` is still current. Returns the stored report,
    /// or `None` when the run was superseded.
    pub fn commit(&self, token: RunToken, report: ComparisonReport) -> Option<Arc<ComparisonReport>> {
        let mut slot = self.slot();
        // Checked under the lock so a newer commit cannot interleave.
        if !self.is_current(token) {
            tracing::warn!(
                generation = token.0,
                current = self.generation.load(Ordering::SeqCst),
                "discarding stale comparison"
            );
            return None;
        }
        let report = Arc::new(report);
        *slot = Some(Arc::clone(&report));
        Some(report)
    }

    /// Most recent committed comparison, if any.
    pub fn latest(&self) -> Option<Arc<ComparisonReport>> {
        self.slot().clone()
    }

    /// Run a comparison and commit it.
    ///
    /// `Ok(None)` means the run succeeded but a newer run had started meanwhile.
    /// Requests rejected up front do not supersede a run in flight.
    pub fn run<S: SampleSource + ?Sized>(
        &self,
        source: &S,
        sensor_a: &str,
        sensor_b: &str,
        config: &AnalyticsConfig,
    ) -> Result<Option<Arc<ComparisonReport>>, CompareError> {
        check_pair(sensor_a, sensor_b)?;
        let token = self.begin();
        let report = compare(source, sensor_a, sensor_b, config)?;
        Ok(self.commit(token, report))
    }
}
