//! In-memory cache of the test-case catalog
//!
//! Only one download runs at a time. Callers that arrive while a download is
//! in flight get an empty catalog instead of waiting, so editor requests stay
//! responsive; they see the real catalog on their next call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use eyre::Result;
use tracing::debug;
use xraycov_core::TestCase;

use crate::jira::{PageFetcher, Progress, fetch_all_test_cases};

pub struct TestCaseStore {
    fetcher: Arc<dyn PageFetcher>,
    sanitize: Vec<String>,
    cases: RwLock<Arc<Vec<TestCase>>>,
    fetching: AtomicBool,
}

/// Clears the in-flight flag when the download ends, even on error
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TestCaseStore {
    pub fn new(fetcher: Arc<dyn PageFetcher>, sanitize: Vec<String>) -> Self {
        Self {
            fetcher,
            sanitize,
            cases: RwLock::new(Arc::new(Vec::new())),
            fetching: AtomicBool::new(false),
        }
    }

    /// Cached catalog, fetching it first if the cache is empty
    pub fn get(&self) -> Result<Arc<Vec<TestCase>>> {
        self.get_with_progress(|_| {})
    }

    pub fn get_with_progress(&self, on_progress: impl FnMut(Progress)) -> Result<Arc<Vec<TestCase>>> {
        let cached = self.cached();
        if !cached.is_empty() {
            return Ok(cached);
        }
        self.fetch(on_progress)
    }

    /// Re-download the catalog regardless of the cache
    pub fn refresh(&self, on_progress: impl FnMut(Progress)) -> Result<Arc<Vec<TestCase>>> {
        self.fetch(on_progress)
    }

    /// Drop the cached catalog
    pub fn invalidate(&self) {
        *self.cases.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(Vec::new());
    }

    /// Current cache contents without fetching
    pub fn cached(&self) -> Arc<Vec<TestCase>> {
        self.cases
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    fn fetch(&self, on_progress: impl FnMut(Progress)) -> Result<Arc<Vec<TestCase>>> {
        if self.fetching.swap(true, Ordering::AcqRel) {
            debug!("catalog download already in progress");
            return Ok(Arc::new(Vec::new()));
        }
        let _guard = FetchGuard(&self.fetching);

        let cases = Arc::new(fetch_all_test_cases(
            self.fetcher.as_ref(),
            &self.sanitize,
            on_progress,
        )?);

        if !cases.is_empty() {
            *self.cases.write().unwrap_or_else(|e| e.into_inner()) = cases.clone();
        }
        Ok(cases)
    }
}
