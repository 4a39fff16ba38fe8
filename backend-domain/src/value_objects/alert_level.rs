// Alert level value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity tier of an anomaly. Variants are declared in increasing
/// severity so the derived ordering can be used for thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Yellow => "yellow",
            AlertLevel::Orange => "orange",
            AlertLevel::Red => "red",
        }
    }
}

impl From<&str> for AlertLevel {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "red" => AlertLevel::Red,
            "orange" => AlertLevel::Orange,
            _ => AlertLevel::Yellow,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_severity() {
        assert!(AlertLevel::Yellow < AlertLevel::Orange);
        assert!(AlertLevel::Orange < AlertLevel::Red);
    }

    #[test]
    fn parse_falls_back_to_yellow() {
        assert_eq!(AlertLevel::from(" RED "), AlertLevel::Red);
        assert_eq!(AlertLevel::from("orange"), AlertLevel::Orange);
        assert_eq!(AlertLevel::from("unknown"), AlertLevel::Yellow);
    }
}
