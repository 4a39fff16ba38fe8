use std::collections::BTreeMap;

use crate::entities::{GridCell, SeismicEvent};
use crate::value_objects::CellId;

/// Buckets events into square lat/lon cells of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct GridBinner {
    cell_size_deg: f64,
}

impl GridBinner {
    pub fn new(cell_size_deg: f64) -> Self {
        Self { cell_size_deg }
    }

    pub fn cell_of(&self, event: &SeismicEvent) -> CellId {
        CellId::from_coordinates(event.latitude, event.longitude, self.cell_size_deg)
    }

    /// Partitions `events` by cell. Every event lands in exactly one cell and
    /// members keep their input order.
    pub fn bin(&self, events: &[SeismicEvent]) -> BTreeMap<CellId, GridCell> {
        let mut cells: BTreeMap<CellId, GridCell> = BTreeMap::new();
        for event in events {
            let cell_id = self.cell_of(event);
            let cell = cells.entry(cell_id).or_insert_with(|| {
                let (center_lat, center_lon) = cell_id.center(self.cell_size_deg);
                GridCell {
                    cell_id,
                    center_lat,
                    center_lon,
                    count: 0,
                    max_magnitude: f64::MIN,
                    avg_magnitude: 0.0,
                    location: event.location.clone(),
                    members: Vec::new(),
                }
            });
            cell.members.push(event.clone());
        }

        for cell in cells.values_mut() {
            cell.count = cell.members.len();
            let sum: f64 = cell.members.iter().map(|event| event.magnitude).sum();
            cell.avg_magnitude = sum / cell.count as f64;
            cell.max_magnitude = cell
                .members
                .iter()
                .map(|event| event.magnitude)
                .fold(f64::MIN, f64::max);
        }
        cells
    }

    /// Member counts only, for the baseline where members are not needed.
    pub fn count(&self, events: &[SeismicEvent]) -> BTreeMap<CellId, usize> {
        let mut counts = BTreeMap::new();
        for event in events {
            *counts.entry(self.cell_of(event)).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::EventSource;
    use chrono::{Duration, TimeZone, Utc};

    fn event(id: usize, lat: f64, lon: f64, mag: f64, location: &str) -> SeismicEvent {
        SeismicEvent {
            event_id: format!("usgs_{id}"),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(id as i64),
            latitude: lat,
            longitude: lon,
            magnitude: mag,
            depth_km: 10.0,
            location: location.to_string(),
            source: EventSource::Usgs,
        }
    }

    #[test]
    fn empty_input_yields_no_cells() {
        let binner = GridBinner::new(0.45);
        assert!(binner.bin(&[]).is_empty());
        assert!(binner.count(&[]).is_empty());
    }

    #[test]
    fn identical_coordinates_share_one_cell() {
        let binner = GridBinner::new(0.45);
        let events: Vec<_> = (0..7)
            .map(|i| event(i, 38.41, 27.14, 2.0 + i as f64 * 0.1, "IZMIR"))
            .collect();
        let cells = binner.bin(&events);
        assert_eq!(cells.len(), 1);
        let cell = cells.values().next().unwrap();
        assert_eq!(cell.count, 7);
        assert_eq!(cell.members.len(), 7);
        assert!((cell.max_magnitude - 2.6).abs() < 1e-9);
        assert!((cell.avg_magnitude - 2.3).abs() < 1e-9);
        assert_eq!(cell.location, "IZMIR");
    }

    #[test]
    fn partition_keeps_every_event_exactly_once() {
        let binner = GridBinner::new(0.45);
        let events = vec![
            event(0, 38.41, 27.14, 2.1, "A"),
            event(1, 38.50, 27.20, 2.2, "B"),
            event(2, 40.10, 29.00, 3.0, "C"),
            event(3, -33.0, -70.6, 4.4, "D"),
            event(4, 40.12, 29.02, 2.8, "E"),
        ];
        let cells = binner.bin(&events);
        let total: usize = cells.values().map(|cell| cell.count).sum();
        assert_eq!(total, events.len());

        let mut seen: Vec<&str> = cells
            .values()
            .flat_map(|cell| cell.members.iter().map(|event| event.event_id.as_str()))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), events.len());

        let counts = binner.count(&events);
        for (cell_id, cell) in &cells {
            assert_eq!(counts.get(cell_id), Some(&cell.count));
        }
    }

    #[test]
    fn representative_location_is_first_member() {
        let binner = GridBinner::new(0.45);
        let events = vec![
            event(0, 40.10, 29.00, 3.0, "first"),
            event(1, 40.12, 29.02, 2.8, "second"),
        ];
        let cells = binner.bin(&events);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells.values().next().unwrap().location, "first");
    }
}
