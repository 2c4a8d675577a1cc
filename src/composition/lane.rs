use serde::{Deserialize, Serialize};

/// Bar-indexed automation of the burst intensity.
///
/// Evaluation is a step function: the lane holds `(bar, amount)` points
/// sorted by bar, and a bar takes the value of the latest point at or
/// before it. Points are kept sorted at insertion, so lookup can binary
/// search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillAutomationLane {
    points: Vec<(u32, f32)>,
}

impl DrillAutomationLane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lane from `(bar, amount)` pairs in any order.
    pub fn from_points(points: &[(u32, f32)]) -> Self {
        let mut lane = Self::new();
        for &(bar, amount) in points {
            lane.add_point(bar, amount);
        }
        lane
    }

    /// Insert a point, keeping the list sorted by bar. A point at an
    /// existing bar replaces the old value.
    pub fn add_point(&mut self, bar: u32, amount: f32) {
        let amount = amount.clamp(0.0, 1.0);
        let idx = self.points.partition_point(|&(b, _)| b < bar);
        if idx < self.points.len() && self.points[idx].0 == bar {
            self.points[idx].1 = amount;
        } else {
            self.points.insert(idx, (bar, amount));
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[(u32, f32)] {
        &self.points
    }

    /// Value of the latest point at or before `bar`. Before the first
    /// point, the first point's value applies; an empty lane reads 0.
    pub fn evaluate_at(&self, bar: u32) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let idx = self.points.partition_point(|&(b, _)| b <= bar);
        if idx == 0 {
            self.points[0].1
        } else {
            self.points[idx - 1].1
        }
    }
}
