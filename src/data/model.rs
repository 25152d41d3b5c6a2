use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use chrono::{Datelike, Month, NaiveDateTime, Timelike, Weekday};

use crate::config::City;

// ---------------------------------------------------------------------------
// TripRecord – one row of a city dataset
// ---------------------------------------------------------------------------

/// A single bikeshare trip.
///
/// `gender` and `birth_year` stay `None` both when the source has no such
/// column and when the cell is blank; [`Columns`] tells the two apart.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub start_station: String,
    pub end_station: String,
    /// Seconds. Some sources store fractional seconds.
    pub trip_duration: f64,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
}

impl TripRecord {
    /// Calendar month of the start time, 1–12.
    pub fn month(&self) -> u32 {
        self.start_time.month()
    }

    pub fn weekday(&self) -> Weekday {
        self.start_time.weekday()
    }

    pub fn hour(&self) -> u32 {
        self.start_time.hour()
    }
}

/// Full English weekday name, e.g. `"Monday"`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ---------------------------------------------------------------------------
// Dataset – all trips for one city
// ---------------------------------------------------------------------------

/// Which optional columns the source file carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Columns {
    pub gender: bool,
    pub birth_year: bool,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub trips: Vec<TripRecord>,
    pub columns: Columns,
}

impl Dataset {
    pub fn new(trips: Vec<TripRecord>, columns: Columns) -> Self {
        Dataset { trips, columns }
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }
}

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// Months offered at the month prompt.
pub const MONTH_CHOICES: [&str; 7] = ["all", "january", "february", "march", "april", "may", "june"];

/// Days offered at the day prompt.
pub const DAY_CHOICES: [&str; 8] = [
    "all", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// The city/month/day triple chosen for one session iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSelection {
    pub city: City,
    /// `None` means all months.
    pub month: Option<Month>,
    /// `None` means all days.
    pub day: Option<Weekday>,
}

impl FilterSelection {
    /// Build a selection from prompt answers (`"all"` disables a filter).
    pub fn from_choices(city: &str, month: &str, day: &str) -> anyhow::Result<Self> {
        let city = City::from_str(city)?;
        let month = match month {
            "all" => None,
            m => Some(parse_month(m)?),
        };
        let day = match day {
            "all" => None,
            d => Some(
                Weekday::from_str(d).map_err(|_| anyhow::anyhow!("unknown day '{d}'"))?,
            ),
        };
        Ok(FilterSelection { city, month, day })
    }
}

/// Map a month name to its calendar month by its first three letters.
/// Only January–June appear in the trip data.
fn parse_month(name: &str) -> anyhow::Result<Month> {
    const PREFIXES: [&str; 6] = ["jan", "feb", "mar", "apr", "may", "jun"];
    let prefix = name.get(..3).unwrap_or(name).to_lowercase();
    let index = PREFIXES
        .iter()
        .position(|p| *p == prefix)
        .ok_or_else(|| anyhow::anyhow!("unknown month '{name}'"))?;
    Month::try_from(index as u8 + 1).map_err(|_| anyhow::anyhow!("unknown month '{name}'"))
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let month = self.month.map_or("all", |m| m.name());
        let day = self.day.map_or("all", weekday_name);
        write!(f, "{} / month: {month} / day: {day}", self.city)
    }
}

// ---------------------------------------------------------------------------
// FilteredView – rows of a dataset that pass the selection
// ---------------------------------------------------------------------------

/// Borrowed subset of a [`Dataset`], as positions into `dataset.trips`.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub dataset: &'a Dataset,
    pub indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every row.
    pub fn all(dataset: &'a Dataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn columns(&self) -> Columns {
        self.dataset.columns
    }

    pub fn trips(&self) -> impl Iterator<Item = &'a TripRecord> + '_ {
        self.indices.iter().map(|&i| &self.dataset.trips[i])
    }

    /// Rows at view positions `range`, clamped to the view, paired with
    /// their index in the full dataset.
    pub fn rows(&self, range: Range<usize>) -> Vec<(usize, &'a TripRecord)> {
        let end = range.end.min(self.indices.len());
        let start = range.start.min(end);
        self.indices[start..end]
            .iter()
            .map(|&i| (i, &self.dataset.trips[i]))
            .collect()
    }
}
