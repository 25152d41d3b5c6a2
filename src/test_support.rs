//! Builders for in-memory trips used across unit tests.

use crate::data::loader::parse_timestamp;
use crate::data::model::{Columns, Dataset, TripRecord};

/// A trip starting at `start` lasting `duration` seconds, no demographics.
pub fn trip(start: &str, from: &str, to: &str, duration: f64) -> TripRecord {
    let start_time = parse_timestamp(start).unwrap();
    TripRecord {
        start_time,
        end_time: start_time + chrono::Duration::seconds(duration.max(0.0) as i64),
        start_station: from.to_string(),
        end_station: to.to_string(),
        trip_duration: duration,
        user_type: Some("Subscriber".to_string()),
        gender: None,
        birth_year: None,
    }
}

/// A trip that only matters for its user fields.
pub fn person(user_type: &str, gender: Option<&str>, birth_year: Option<i32>) -> TripRecord {
    TripRecord {
        user_type: Some(user_type.to_string()),
        gender: gender.map(str::to_string),
        birth_year,
        ..trip("2017-01-02 08:00:00", "A", "B", 600.0)
    }
}

/// Dataset without optional columns.
pub fn dataset(trips: Vec<TripRecord>) -> Dataset {
    Dataset::new(trips, Columns::default())
}

pub fn dataset_with(columns: Columns, trips: Vec<TripRecord>) -> Dataset {
    Dataset::new(trips, columns)
}
