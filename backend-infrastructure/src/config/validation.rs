use anyhow::{anyhow, Result};

use backend_domain::{DetectionConfig, EventSource, ResolutionPolicy};

pub fn validate_detection(config: &DetectionConfig) -> Result<()> {
    if !(config.cell_size_deg.is_finite() && config.cell_size_deg > 0.0) {
        return Err(anyhow!("detection.cell_size_deg must be > 0"));
    }
    if !(config.cell_radius_km > 0.0) {
        return Err(anyhow!("detection.cell_radius_km must be > 0"));
    }
    if config.detection_window_hours <= 0 {
        return Err(anyhow!("detection.detection_window_hours must be > 0"));
    }
    if config.baseline_days <= 0 {
        return Err(anyhow!("detection.baseline_days must be > 0"));
    }
    if config.baseline_gap_hours < 0 {
        return Err(anyhow!("detection.baseline_gap_hours must not be negative"));
    }
    if !(config.baseline_floor_rate > 0.0) {
        return Err(anyhow!("detection.baseline_floor_rate must be > 0"));
    }

    let frequency = &config.frequency;
    if !(frequency.z_threshold <= frequency.orange_z && frequency.orange_z <= frequency.red_z) {
        return Err(anyhow!(
            "detection.frequency tiers must satisfy z_threshold <= orange_z <= red_z"
        ));
    }

    let escalation = &config.escalation;
    if escalation.latest_count == 0 || escalation.min_cell_events <= escalation.latest_count {
        return Err(anyhow!(
            "detection.escalation.min_cell_events must exceed latest_count (>= 1)"
        ));
    }

    if let ResolutionPolicy::MaxAge { max_age_hours } = config.resolution {
        if max_age_hours <= 0 {
            return Err(anyhow!("detection.resolution.max_age_hours must be > 0"));
        }
    }
    Ok(())
}

pub fn parse_sources(names: &[String]) -> Result<Vec<EventSource>> {
    let mut sources = Vec::new();
    for name in names {
        match EventSource::from(name.as_str()) {
            EventSource::Unknown => return Err(anyhow!("unknown collector source '{}'", name)),
            source if !sources.contains(&source) => sources.push(source),
            _ => {}
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_detection(&DetectionConfig::default()).is_ok());
    }

    #[test]
    fn rejects_non_positive_sizes_and_windows() {
        let mut config = DetectionConfig::default();
        config.cell_size_deg = 0.0;
        assert!(validate_detection(&config).is_err());

        let mut config = DetectionConfig::default();
        config.detection_window_hours = 0;
        assert!(validate_detection(&config).is_err());

        let mut config = DetectionConfig::default();
        config.baseline_days = -1;
        assert!(validate_detection(&config).is_err());
    }

    #[test]
    fn rejects_inverted_tiers() {
        let mut config = DetectionConfig::default();
        config.frequency.orange_z = 6.0;
        assert!(validate_detection(&config).is_err());
    }

    #[test]
    fn sources_parse_case_insensitively() {
        let names = vec!["Kandilli".to_string(), "usgs".to_string(), "usgs".to_string()];
        assert_eq!(
            parse_sources(&names).unwrap(),
            vec![EventSource::Kandilli, EventSource::Usgs]
        );
        assert!(parse_sources(&["emsc".to_string()]).is_err());
    }
}
