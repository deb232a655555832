use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Per-id "updating" markers.
///
/// Counted rather than a plain set so two overlapping mutations on the same
/// id keep the marker up until both have finished. Markers are released by
/// dropping the returned guard, so failed, rejected and cancelled requests
/// clear them too.
#[derive(Debug, Default)]
pub struct UpdatingSet {
    counts: Mutex<HashMap<String, usize>>,
}

impl UpdatingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, id: &str) -> UpdatingGuard<'_> {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        *counts.entry(id.to_string()).or_insert(0) += 1;
        UpdatingGuard {
            set: self,
            id: id.to_string(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<String> = counts.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn release(&self, id: &str) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = counts.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                counts.remove(id);
            }
        }
    }
}

pub struct UpdatingGuard<'a> {
    set: &'a UpdatingSet,
    id: String,
}

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.set.release(&self.id);
    }
}

/// Ledger-wide "loading" flag, up while any load or add is in flight.
#[derive(Debug, Default)]
pub struct LoadingFlag {
    active: AtomicUsize,
}

impl LoadingFlag {
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { flag: self }
    }

    pub fn is_set(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }
}

pub struct LoadingGuard<'a> {
    flag: &'a LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.active.fetch_sub(1, Ordering::SeqCst);
    }
}
