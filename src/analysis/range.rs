// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Report windows, anchored at local midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[default]
    Today,
    Last7Days,
    Last30Days,
}

impl DateRange {
    /// `(start, now)` where start is midnight today in `now`'s timezone,
    /// moved back 7 or 30 days for the longer ranges
    pub fn time_range<Tz: TimeZone>(&self, now: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
        let tz = now.timezone();
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .unwrap_or_else(|| now.clone());

        let start = match self {
            DateRange::Today => midnight,
            DateRange::Last7Days => midnight - Duration::days(7),
            DateRange::Last30Days => midnight - Duration::days(30),
        };

        (start.with_timezone(&Utc), now.with_timezone(&Utc))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DateRange::Today => "Today",
            DateRange::Last7Days => "Last 7 days",
            DateRange::Last30Days => "Last 30 days",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(DateRange::Today),
            "7d" | "week" | "last7days" => Ok(DateRange::Last7Days),
            "30d" | "month" | "last30days" => Ok(DateRange::Last30Days),
            other => Err(format!("unknown range '{}', expected today, 7d or 30d", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 15, 30, 0).unwrap();
        let (start, end) = DateRange::Today.time_range(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
        assert_eq!(end, now);
    }

    #[test]
    fn test_longer_ranges_go_back_from_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 15, 30, 0).unwrap();

        let (start, _) = DateRange::Last7Days.time_range(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap());

        let (start, _) = DateRange::Last30Days.time_range(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_range_names() {
        assert_eq!("today".parse::<DateRange>().unwrap(), DateRange::Today);
        assert_eq!("7D".parse::<DateRange>().unwrap(), DateRange::Last7Days);
        assert_eq!("month".parse::<DateRange>().unwrap(), DateRange::Last30Days);
        assert!("year".parse::<DateRange>().is_err());
    }
}
