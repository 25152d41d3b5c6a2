use std::fmt;

use super::{Report, StatsError};
use crate::data::model::FilteredView;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Total and mean trip duration, in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub total_hours: f64,
    pub mean_hours: f64,
}

impl Report for DurationStats {
    const HEADING: &'static str = "Calculating Trip Duration...";

    fn compute(view: &FilteredView<'_>) -> Result<Self, StatsError> {
        // NaN durations are skipped in both the total and the mean.
        let (total, count) = view
            .trips()
            .map(|t| t.trip_duration)
            .filter(|d| !d.is_nan())
            .fold((0.0, 0usize), |(sum, n), d| (sum + d, n + 1));
        if count == 0 {
            return Err(StatsError::EmptySelection);
        }
        let mean = total / count as f64;

        Ok(DurationStats {
            total_hours: total / SECONDS_PER_HOUR,
            mean_hours: mean / SECONDS_PER_HOUR,
        })
    }
}

impl fmt::Display for DurationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The total travel time: {:.4} hours", self.total_hours)?;
        writeln!(f, "The mean travel time: {:.4} hours", self.mean_hours)
    }
}
