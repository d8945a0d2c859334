use std::collections::HashMap;

use crate::snapshot::Snapshot;

/// Per-category count projection.
///
/// The displayed categories are exactly the configured set, in configured
/// order. Categories the engine has not reported yet render as 0, never as
/// absent. The total sums configured categories only.
pub struct CounterView {
    categories: Vec<String>,
    counts: HashMap<String, u64>,
}

impl CounterView {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            counts: HashMap::new(),
        }
    }

    /// Replace displayed counts with the snapshot's. Wholesale: the engine
    /// is the source of cumulative truth, the view never adds.
    pub fn apply(&mut self, snapshot: &Snapshot) {
        self.counts = snapshot.counts.clone();
    }

    pub fn count(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.categories.iter().map(|c| self.count(c)).sum()
    }

    /// `(category, count)` rows in configured order, for rendering.
    pub fn rows(&self) -> Vec<(&str, u64)> {
        self.categories
            .iter()
            .map(|c| (c.as_str(), self.count(c)))
            .collect()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn snapshot(pairs: &[(&str, u64)]) -> Snapshot {
        Snapshot {
            frame: None,
            counts: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            tick: 0,
            captured_at: SystemTime::now(),
        }
    }

    fn view() -> CounterView {
        CounterView::new(vec!["car".to_string(), "bus".to_string()])
    }

    #[test]
    fn unseen_categories_render_zero() {
        let mut view = view();
        view.apply(&snapshot(&[("car", 3)]));
        assert_eq!(view.rows(), vec![("car", 3), ("bus", 0)]);
    }

    #[test]
    fn rows_are_exactly_the_configured_set() {
        let mut view = view();
        // "tractor" is not configured; it must not appear anywhere.
        view.apply(&snapshot(&[("car", 1), ("tractor", 9)]));
        let rows = view.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(name, _)| *name != "tractor"));
    }

    #[test]
    fn total_sums_configured_categories_only() {
        let mut view = view();
        view.apply(&snapshot(&[("car", 2), ("bus", 1), ("tractor", 9)]));
        assert_eq!(view.total(), 3);
    }

    #[test]
    fn apply_replaces_counts_wholesale() {
        let mut view = view();
        view.apply(&snapshot(&[("car", 2), ("bus", 1)]));
        view.apply(&snapshot(&[("car", 3)]));
        assert_eq!(view.count("car"), 3);
        // "bus" disappeared from the latest snapshot: it reads 0, it does
        // not keep its old value.
        assert_eq!(view.count("bus"), 0);
    }
}
