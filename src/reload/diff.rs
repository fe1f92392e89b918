//! Bundle-key set difference.
//!
//! A client reports the keys it last loaded (`previous`); the server knows
//! the keys it currently publishes (`current`). Any key in exactly one of
//! the two sets needs action:
//!
//! - in `current` only: the client lacks it ([`Drift::Missing`])
//! - in `previous` only: the client holds an artifact the server no longer
//!   lists ([`Drift::Stale`])

use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Drift {
    Missing,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct KeyDrift {
    pub key: String,
    pub drift: Drift,
}

/// Symmetric difference of two key sets, sorted and deduplicated.
///
/// `diff(a, b) == diff(b, a)` for any inputs.
pub fn diff<S: AsRef<str>>(current: &[S], previous: &[S]) -> Vec<String> {
    diff_tagged(current, previous)
        .into_iter()
        .map(|d| d.key)
        .collect()
}

/// [`diff`] with the side each key came from.
pub fn diff_tagged<S: AsRef<str>>(current: &[S], previous: &[S]) -> Vec<KeyDrift> {
    let current: BTreeSet<&str> = current.iter().map(AsRef::as_ref).collect();
    let previous: BTreeSet<&str> = previous.iter().map(AsRef::as_ref).collect();

    let missing = current.difference(&previous).map(|k| KeyDrift {
        key: k.to_string(),
        drift: Drift::Missing,
    });
    let stale = previous.difference(&current).map(|k| KeyDrift {
        key: k.to_string(),
        drift: Drift::Stale,
    });

    let mut drifts: Vec<KeyDrift> = missing.chain(stale).collect();
    drifts.sort_by(|a, b| a.key.cmp(&b.key));
    drifts
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &[&str] = &[];

    #[test]
    fn test_identical_sets() {
        assert!(diff(&["k1", "k2"], &["k2", "k1"]).is_empty());
    }

    #[test]
    fn test_against_empty() {
        assert_eq!(diff(&["k2", "k1"], EMPTY), ["k1", "k2"]);
        assert_eq!(diff(EMPTY, &["k1", "k2"]), ["k1", "k2"]);
        assert!(diff(EMPTY, EMPTY).is_empty());
    }

    #[test]
    fn test_symmetric() {
        let a = ["k1", "k2", "k5"];
        let b = ["k2", "k3"];
        assert_eq!(diff(&a, &b), diff(&b, &a));
        assert_eq!(diff(&a, &b), ["k1", "k3", "k5"]);
    }

    #[test]
    fn test_one_key_swapped() {
        let previous = ["k1", "k2"];
        let current = ["k1", "k3"];
        assert_eq!(diff(&current, &previous), ["k2", "k3"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(diff(&["k1", "k1", "k2"], &["k2", "k2"]), ["k1"]);
    }

    #[test]
    fn test_tagged_direction() {
        let drifts = diff_tagged(&["k1", "k3"], &["k1", "k2"]);
        assert_eq!(
            drifts,
            vec![
                KeyDrift {
                    key: "k2".into(),
                    drift: Drift::Stale
                },
                KeyDrift {
                    key: "k3".into(),
                    drift: Drift::Missing
                },
            ]
        );
    }
}
