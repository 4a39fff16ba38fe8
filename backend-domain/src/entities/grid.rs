// Grid cell entity
// Derived per analysis run, never persisted

use serde::Serialize;

use crate::entities::SeismicEvent;
use crate::value_objects::CellId;

#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub cell_id: CellId,
    pub center_lat: f64,
    pub center_lon: f64,
    pub count: usize,
    pub max_magnitude: f64,
    pub avg_magnitude: f64,
    /// Location label of the first member, as received.
    pub location: String,
    pub members: Vec<SeismicEvent>,
}
