// Identifier value objects

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quantized grid coordinates. Two points share a cell exactly when their
/// rounded `coord / cell_size` indices are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub lat_index: i64,
    pub lon_index: i64,
}

impl CellId {
    pub fn from_coordinates(latitude: f64, longitude: f64, cell_size_deg: f64) -> Self {
        Self {
            lat_index: quantize(latitude, cell_size_deg),
            lon_index: quantize(longitude, cell_size_deg),
        }
    }

    pub fn center(&self, cell_size_deg: f64) -> (f64, f64) {
        (
            self.lat_index as f64 * cell_size_deg,
            self.lon_index as f64 * cell_size_deg,
        )
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lat_index, self.lon_index)
    }
}

fn quantize(value: f64, cell_size_deg: f64) -> i64 {
    (value / cell_size_deg).round() as i64
}
