//! Forecast time handling and date formatting.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A forecast valid time: model reference (initialisation) time plus lead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastTime {
    /// Model run/reference time (UTC, naive)
    pub reference_time: NaiveDateTime,
    /// Forecast lead in hours
    pub lead_hours: f64,
}

impl ForecastTime {
    pub fn new(reference_time: NaiveDateTime, lead_hours: f64) -> Self {
        Self {
            reference_time,
            lead_hours,
        }
    }

    /// Reference time + lead.
    pub fn valid_time(&self) -> NaiveDateTime {
        let seconds = (self.lead_hours * 3600.0).round() as i64;
        self.reference_time + Duration::seconds(seconds)
    }

    /// Lead hours as shown on charts and in filenames (truncated to whole hours).
    pub fn lead_whole_hours(&self) -> i64 {
        self.lead_hours.trunc() as i64
    }
}

/// Date formatting used for chart annotations and filenames.
///
/// Passed explicitly with every render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `2024年01月15日12时` / `01月15日12时`
    #[default]
    Chinese,
    /// `2024-01-15 12:00` / `01-15 12:00`
    Iso,
}

impl DateStyle {
    /// Full date with year, used in info boxes and filenames.
    pub fn format_full(&self, dt: &NaiveDateTime) -> String {
        match self {
            DateStyle::Chinese => dt.format("%Y年%m月%d日%H时").to_string(),
            DateStyle::Iso => dt.format("%Y-%m-%d %H:00").to_string(),
        }
    }

    /// Short date without year, used in legends.
    pub fn format_short(&self, dt: &NaiveDateTime) -> String {
        match self {
            DateStyle::Chinese => dt.format("%m月%d日%H时").to_string(),
            DateStyle::Iso => dt.format("%m-%d %H:00").to_string(),
        }
    }

    /// Full date safe to embed in a file name.
    pub fn format_filename(&self, dt: &NaiveDateTime) -> String {
        match self {
            DateStyle::Chinese => self.format_full(dt),
            DateStyle::Iso => dt.format("%Y%m%d%H").to_string(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chinese" | "zh" | "zh_cn" => Some(DateStyle::Chinese),
            "iso" => Some(DateStyle::Iso),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn init() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_valid_time_crosses_day() {
        let ft = ForecastTime::new(init(), 24.0);
        assert_eq!(
            ft.valid_time(),
            NaiveDate::from_ymd_opt(2024, 1, 16)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_lead_whole_hours_truncates() {
        assert_eq!(ForecastTime::new(init(), 36.9).lead_whole_hours(), 36);
        assert_eq!(ForecastTime::new(init(), 6.0).lead_whole_hours(), 6);
    }

    #[test]
    fn test_chinese_formats() {
        let style = DateStyle::Chinese;
        assert_eq!(style.format_full(&init()), "2024年01月15日08时");
        assert_eq!(style.format_short(&init()), "01月15日08时");
    }

    #[test]
    fn test_iso_formats() {
        let style = DateStyle::Iso;
        assert_eq!(style.format_full(&init()), "2024-01-15 08:00");
        assert_eq!(style.format_short(&init()), "01-15 08:00");
        assert_eq!(style.format_filename(&init()), "2024011508");
    }

    #[test]
    fn test_parse_style() {
        assert_eq!(DateStyle::parse("ISO"), Some(DateStyle::Iso));
        assert_eq!(DateStyle::parse("zh_cn"), Some(DateStyle::Chinese));
        assert_eq!(DateStyle::parse("klingon"), None);
    }
}
