use std::fmt;

use super::{Report, StatsError, most_frequent};
use crate::data::model::FilteredView;

/// Most popular stations and trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationStats {
    pub start_station: String,
    pub end_station: String,
    /// Most frequent (start, end) pair.
    pub trip: (String, String),
    pub trip_count: usize,
}

impl Report for StationStats {
    const HEADING: &'static str = "Calculating The Most Popular Stations and Trip...";

    fn compute(view: &FilteredView<'_>) -> Result<Self, StatsError> {
        let (start, _) =
            most_frequent(view.trips().map(|t| t.start_station.as_str())).ok_or(StatsError::EmptySelection)?;
        let (end, _) =
            most_frequent(view.trips().map(|t| t.end_station.as_str())).ok_or(StatsError::EmptySelection)?;
        let ((from, to), trip_count) =
            most_frequent(view.trips().map(|t| (t.start_station.as_str(), t.end_station.as_str())))
                .ok_or(StatsError::EmptySelection)?;

        Ok(StationStats {
            start_station: start.to_string(),
            end_station: end.to_string(),
            trip: (from.to_string(), to.to_string()),
            trip_count,
        })
    }
}

impl fmt::Display for StationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The most common start station used: {}", self.start_station)?;
        writeln!(f, "The most common end station used: {}", self.end_station)?;
        writeln!(f, "The most frequent combination of start station and end station trip:")?;
        writeln!(f, " {} -> {}    {} trips", self.trip.0, self.trip.1, self.trip_count)
    }
}
