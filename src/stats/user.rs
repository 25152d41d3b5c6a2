use std::fmt;

use super::{Report, StatsError, most_frequent, value_counts};
use crate::data::model::FilteredView;

/// State of an optional column within the current view.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    /// The city's source file has no such column.
    NotInDataset,
    /// The column exists but every row in the view is blank.
    NoValues,
    Values(T),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenderShare {
    pub gender: String,
    pub count: usize,
    /// Share of all rows in the view, blanks included.
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthYearStats {
    pub earliest: i32,
    pub most_recent: i32,
    pub most_common: i32,
}

/// Statistics on bikeshare users.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub user_types: Vec<(String, usize)>,
    pub gender: Availability<Vec<GenderShare>>,
    pub birth_year: Availability<BirthYearStats>,
}

impl Report for UserStats {
    const HEADING: &'static str = "Calculating User Stats...";

    fn compute(view: &FilteredView<'_>) -> Result<Self, StatsError> {
        if view.is_empty() {
            return Err(StatsError::EmptySelection);
        }
        let columns = view.columns();

        let user_types = value_counts(view.trips().filter_map(|t| t.user_type.as_deref()))
            .into_iter()
            .map(|(kind, count)| (kind.to_string(), count))
            .collect();

        let gender = if !columns.gender {
            Availability::NotInDataset
        } else {
            let total = view.len() as f64;
            let shares: Vec<GenderShare> = value_counts(view.trips().filter_map(|t| t.gender.as_deref()))
                .into_iter()
                .map(|(gender, count)| GenderShare {
                    gender: gender.to_string(),
                    count,
                    percent: count as f64 / total * 100.0,
                })
                .collect();
            if shares.is_empty() {
                Availability::NoValues
            } else {
                Availability::Values(shares)
            }
        };

        let birth_year = if !columns.birth_year {
            Availability::NotInDataset
        } else {
            let years = || view.trips().filter_map(|t| t.birth_year);
            match (years().min(), years().max(), most_frequent(years())) {
                (Some(earliest), Some(most_recent), Some((most_common, _))) => Availability::Values(BirthYearStats {
                    earliest,
                    most_recent,
                    most_common,
                }),
                _ => Availability::NoValues,
            }
        };

        Ok(UserStats {
            user_types,
            gender,
            birth_year,
        })
    }
}

impl fmt::Display for UserStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The number of user types:")?;
        for (kind, count) in &self.user_types {
            writeln!(f, "  {kind:<12} {count}")?;
        }

        match &self.gender {
            Availability::NotInDataset => writeln!(f, "The city's data don't have gender.")?,
            Availability::NoValues => writeln!(f, "No gender was recorded for this selection.")?,
            Availability::Values(shares) => {
                writeln!(f, "The number of gender:")?;
                for share in shares {
                    writeln!(f, "  {:<12} {}", share.gender, share.count)?;
                }
                writeln!(f, "Gender percentage distribution:")?;
                for share in shares {
                    writeln!(f, "  {:<12} {:.1}%", share.gender, share.percent)?;
                }
            }
        }

        match &self.birth_year {
            Availability::NotInDataset => writeln!(f, "The city's data don't have birth year."),
            Availability::NoValues => writeln!(f, "No birth year was recorded for this selection."),
            Availability::Values(years) => {
                writeln!(f, "The earliest year of birth: {}", years.earliest)?;
                writeln!(f, "The most recent year of birth: {}", years.most_recent)?;
                writeln!(f, "The most common year of birth: {}", years.most_common)
            }
        }
    }
}
