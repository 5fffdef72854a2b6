//! Occupancy aggregator.
//!
//! Pure summary over the registry size and the ledger's status counts; a
//! read-only consumer used by dashboards and reports.

use serde::Serialize;

use crate::ledger::StatusCounts;

/// Summary counts for the whole inventory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccupancySummary {
    pub total: usize,
    pub occupied: usize,
    pub available: usize,
    /// `occupied / total`; `0.0` for an empty inventory.
    pub occupancy_rate: f64,
}

impl OccupancySummary {
    /// Builds the summary from the inventory size and current status counts.
    pub fn from_counts(total: usize, counts: &StatusCounts) -> Self {
        let occupancy_rate = if total == 0 {
            0.0
        } else {
            counts.occupied as f64 / total as f64
        };
        Self {
            total,
            occupied: counts.occupied,
            available: counts.available,
            occupancy_rate,
        }
    }

    /// The rate rounded to the caller's display precision.
    pub fn rate_rounded(&self, digits: u32) -> f64 {
        let factor = 10f64.powi(digits as i32);
        (self.occupancy_rate * factor).round() / factor
    }
}
