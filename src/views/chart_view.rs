use crate::snapshot::Snapshot;

/// Summary series handed to the external plotting collaborator: one bar
/// series of absolute counts and one proportion series for the
/// distribution donut.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartModel {
    pub bars: Vec<(String, u64)>,
    pub proportions: Vec<(String, f64)>,
}

/// Chart projection over the latest counts.
///
/// Recomputed from scratch on every update; the engine is the source of
/// cumulative truth, so the view never accumulates across ticks.
pub struct ChartView {
    categories: Vec<String>,
    model: ChartModel,
}

impl ChartView {
    pub fn new(categories: Vec<String>) -> Self {
        let model = ChartModel {
            bars: categories.iter().map(|c| (c.clone(), 0)).collect(),
            proportions: Vec::new(),
        };
        Self { categories, model }
    }

    pub fn apply(&mut self, snapshot: &Snapshot) {
        let bars: Vec<(String, u64)> = self
            .categories
            .iter()
            .map(|c| (c.clone(), snapshot.count(c)))
            .collect();
        let total: u64 = bars.iter().map(|(_, count)| count).sum();
        let proportions = if total == 0 {
            Vec::new()
        } else {
            bars.iter()
                .map(|(category, count)| (category.clone(), *count as f64 / total as f64))
                .collect()
        };
        self.model = ChartModel { bars, proportions };
    }

    pub fn model(&self) -> &ChartModel {
        &self.model
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
