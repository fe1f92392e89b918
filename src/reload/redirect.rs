use super::diff::{KeyDrift, diff, diff_tagged};

/// Client-reported transition between two bundle key sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectEvent {
    /// Keys the page now references.
    pub bundle_keys: Vec<String>,
    /// Keys the page referenced before.
    pub previous_bundle_keys: Vec<String>,
}

impl RedirectEvent {
    pub fn new(bundle_keys: Vec<String>, previous_bundle_keys: Vec<String>) -> Self {
        Self {
            bundle_keys,
            previous_bundle_keys,
        }
    }

    /// Keys that differ between the two sets.
    pub fn changes(&self) -> Vec<String> {
        diff(&self.bundle_keys, &self.previous_bundle_keys)
    }

    pub fn drifts(&self) -> Vec<KeyDrift> {
        diff_tagged(&self.bundle_keys, &self.previous_bundle_keys)
    }

    pub fn is_noop(&self) -> bool {
        self.changes().is_empty()
    }
}
