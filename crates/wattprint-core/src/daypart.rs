//! Season and part-of-day derivation for datacenter local time

use serde::{Deserialize, Serialize};

/// Timezones treated as Southern Hemisphere for season derivation
const SOUTHERN_TIMEZONES: &[&str] = &[
    "Australia/Sydney",
    "Australia/Melbourne",
    "Australia/Perth",
    "Australia/Brisbane",
    "America/Argentina/Buenos_Aires",
    "America/Sao_Paulo",
    "Pacific/Auckland",
    "Africa/Johannesburg",
    "America/Santiago",
];

/// Meteorological season at the datacenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Derive the season from a local date, reversing the cycle for
    /// Southern Hemisphere timezones.
    pub fn from_date(month: u32, day: u32, timezone: &str) -> Self {
        let northern = Self::northern(month, day);
        if SOUTHERN_TIMEZONES.contains(&timezone) {
            northern.reversed()
        } else {
            northern
        }
    }

    /// Northern Hemisphere season boundaries (solstice/equinox dates)
    fn northern(month: u32, day: u32) -> Self {
        match (month, day) {
            (12, d) if d >= 21 => Self::Winter,
            (1 | 2, _) => Self::Winter,
            (3, d) if d < 20 => Self::Winter,
            (3, _) => Self::Spring,
            (4 | 5, _) => Self::Spring,
            (6, d) if d < 21 => Self::Spring,
            (6, _) => Self::Summer,
            (7 | 8, _) => Self::Summer,
            (9, d) if d < 23 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    fn reversed(self) -> Self {
        match self {
            Self::Winter => Self::Summer,
            Self::Spring => Self::Autumn,
            Self::Summer => Self::Winter,
            Self::Autumn => Self::Spring,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of day at the datacenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PartOfDay {
    /// Derive the part of day from a local hour (0-23)
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

impl std::fmt::Display for PartOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn northern_season_boundaries() {
        assert_eq!(Season::from_date(12, 21, "Europe/Berlin"), Season::Winter);
        assert_eq!(Season::from_date(12, 20, "Europe/Berlin"), Season::Autumn);
        assert_eq!(Season::from_date(1, 15, "Europe/Berlin"), Season::Winter);
        assert_eq!(Season::from_date(3, 19, "Europe/Berlin"), Season::Winter);
        assert_eq!(Season::from_date(3, 20, "Europe/Berlin"), Season::Spring);
        assert_eq!(Season::from_date(6, 20, "Europe/Berlin"), Season::Spring);
        assert_eq!(Season::from_date(6, 21, "Europe/Berlin"), Season::Summer);
        assert_eq!(Season::from_date(9, 22, "Europe/Berlin"), Season::Summer);
        assert_eq!(Season::from_date(9, 23, "Europe/Berlin"), Season::Autumn);
        assert_eq!(Season::from_date(11, 1, "Europe/Berlin"), Season::Autumn);
    }

    #[test]
    fn southern_timezones_reverse_the_cycle() {
        assert_eq!(Season::from_date(1, 15, "Australia/Sydney"), Season::Summer);
        assert_eq!(Season::from_date(7, 15, "Australia/Sydney"), Season::Winter);
        assert_eq!(Season::from_date(4, 15, "America/Sao_Paulo"), Season::Autumn);
        assert_eq!(Season::from_date(10, 15, "Pacific/Auckland"), Season::Spring);
    }

    #[test]
    fn part_of_day_covers_all_hours() {
        assert_eq!(PartOfDay::from_hour(4), PartOfDay::Night);
        assert_eq!(PartOfDay::from_hour(5), PartOfDay::Morning);
        assert_eq!(PartOfDay::from_hour(11), PartOfDay::Morning);
        assert_eq!(PartOfDay::from_hour(12), PartOfDay::Afternoon);
        assert_eq!(PartOfDay::from_hour(16), PartOfDay::Afternoon);
        assert_eq!(PartOfDay::from_hour(17), PartOfDay::Evening);
        assert_eq!(PartOfDay::from_hour(20), PartOfDay::Evening);
        assert_eq!(PartOfDay::from_hour(21), PartOfDay::Night);
        assert_eq!(PartOfDay::from_hour(0), PartOfDay::Night);
    }

    #[test]
    fn seasons_serialize_as_plain_labels() {
        assert_eq!(
            serde_json::to_string(&Season::Winter).unwrap(),
            "\"Winter\""
        );
        assert_eq!(
            serde_json::to_string(&PartOfDay::Afternoon).unwrap(),
            "\"Afternoon\""
        );
    }
}
