//! Descriptive statistics over a filtered view.
//!
//! Each reporter computes a plain value type from a [`FilteredView`] and
//! renders it through `Display`. [`print_report`] wraps one reporter with the
//! heading, timing and separator printed between sections.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

use log::{debug, warn};
use thiserror::Error;

use crate::data::model::FilteredView;

pub mod duration;
pub mod station;
pub mod time;
pub mod user;

pub use duration::DurationStats;
pub use station::StationStats;
pub use time::TimeStats;
pub use user::UserStats;

pub const SEPARATOR: &str = "----------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("No data for this selection.")]
    EmptySelection,
}

/// A statistic computed from a filtered view.
pub trait Report: fmt::Display + Sized {
    /// Progress line printed before computing.
    const HEADING: &'static str;

    fn compute(view: &FilteredView<'_>) -> Result<Self, StatsError>;
}

/// Compute `R` over `view` and print it with heading, elapsed time and a
/// separator. An empty selection prints a notice instead of the statistic.
pub fn print_report<R: Report>(view: &FilteredView<'_>, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\n{}\n", R::HEADING)?;
    let started = Instant::now();

    match R::compute(view) {
        Ok(stats) => write!(out, "{stats}")?,
        Err(err) => {
            warn!("{}: {err}", R::HEADING);
            writeln!(out, "{err}")?;
        }
    }

    let elapsed = started.elapsed();
    debug!("{} took {elapsed:?} over {} trips", R::HEADING, view.len());
    writeln!(out, "\nThis took {:.6} seconds.", elapsed.as_secs_f64())?;
    writeln!(out, "{SEPARATOR}")
}

// ---------------------------------------------------------------------------
// Counting helpers
// ---------------------------------------------------------------------------

/// Count occurrences of each value, most frequent first. Equal counts are
/// ordered by ascending value.
pub fn value_counts<T: Ord>(values: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut counts: Vec<(T, usize)> = counts.into_iter().collect();
    // Stable sort keeps the ascending key order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The most frequent value and its count; ties go to the smallest value.
pub fn most_frequent<T: Ord>(values: impl IntoIterator<Item = T>) -> Option<(T, usize)> {
    value_counts(values).into_iter().next()
}
