use std::fmt;

use chrono::{Month, Weekday};

use super::{Report, StatsError, most_frequent};
use crate::data::model::{FilteredView, weekday_name};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Most frequent times of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStats {
    /// Calendar month, 1–12.
    pub month: u32,
    pub day: Weekday,
    /// Start hour, 0–23.
    pub hour: u32,
}

impl Report for TimeStats {
    const HEADING: &'static str = "Calculating The Most Frequent Times of Travel...";

    fn compute(view: &FilteredView<'_>) -> Result<Self, StatsError> {
        let (month, _) = most_frequent(view.trips().map(|t| t.month())).ok_or(StatsError::EmptySelection)?;
        // Counted by position in the week so ties resolve Monday first.
        let (day, _) = most_frequent(view.trips().map(|t| t.weekday().num_days_from_monday()))
            .ok_or(StatsError::EmptySelection)?;
        let (hour, _) = most_frequent(view.trips().map(|t| t.hour())).ok_or(StatsError::EmptySelection)?;

        Ok(TimeStats {
            month,
            day: WEEK[day as usize],
            hour,
        })
    }
}

impl fmt::Display for TimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match u8::try_from(self.month).ok().and_then(|m| Month::try_from(m).ok()) {
            Some(name) => writeln!(f, "The most common month: {} ({})", self.month, name.name())?,
            None => writeln!(f, "The most common month: {}", self.month)?,
        }
        writeln!(f, "The most common day: {}", weekday_name(self.day))?;
        writeln!(f, "The most common hour: {}", self.hour)
    }
}
