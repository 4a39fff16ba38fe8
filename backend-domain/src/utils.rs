// Time and geometry helpers

use chrono::Utc;

const KM_PER_DEGREE: f64 = 111.0;

pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Latitude/longitude box of roughly `radius_km` around a point, as
/// `(lat_min, lat_max, lon_min, lon_max)`.
pub fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> (f64, f64, f64, f64) {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().abs().max(0.01);
    let lon_delta = radius_km / (KM_PER_DEGREE * cos_lat);
    (lat - lat_delta, lat + lat_delta, lon - lon_delta, lon + lon_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_widens_longitude_away_from_equator() {
        let (lat_min, lat_max, lon_min, lon_max) = bounding_box(60.0, 10.0, 111.0);
        assert!((lat_max - lat_min - 2.0).abs() < 1e-9);
        assert!((lon_max - lon_min - 4.0).abs() < 1e-6);
    }
}
