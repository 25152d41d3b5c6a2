use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use log::debug;

use crate::data::loader::{BIRTH_YEAR, END_STATION, END_TIME, GENDER, START_STATION, START_TIME, TRIP_DURATION, USER_TYPE};
use crate::data::model::{Columns, FilteredView, TripRecord, weekday_name};
use crate::prompt::Console;

pub const PAGE_SIZE: usize = 5;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// RowPager – positional cursor over a filtered view
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RowPager {
    offset: usize,
}

impl RowPager {
    /// The next `PAGE_SIZE` rows, paired with their dataset index. Past the
    /// end this is partial or empty.
    pub fn next_page<'a>(&mut self, view: &FilteredView<'a>) -> Vec<(usize, &'a TripRecord)> {
        let rows = view.rows(self.offset..self.offset + PAGE_SIZE);
        self.offset += PAGE_SIZE;
        rows
    }
}

/// Show raw trips five at a time while the user answers `yes`.
pub fn display_data<R: BufRead, W: Write>(console: &mut Console<R, W>, view: &FilteredView<'_>) -> Result<()> {
    let mut pager = RowPager::default();
    let mut more = console.confirm("\nWould you like to view 5 rows of individual trip data? Enter yes or no: ")?;
    while more {
        let rows = pager.next_page(view);
        debug!("showing {} rows at offset {}", rows.len(), pager.offset - PAGE_SIZE);
        let table = render_rows(&rows, view.columns())?;
        writeln!(console.out(), "{table}")?;
        more = console.confirm("Do you wish to continue? Enter yes or no: ")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Render rows as a text table: the dataset index, the source columns the
/// city has, then the derived `month` and `day_of_week`.
pub fn render_rows(rows: &[(usize, &TripRecord)], columns: Columns) -> Result<String> {
    let mut fields = vec![Field::new("", DataType::UInt64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(UInt64Array::from_iter_values(
        rows.iter().map(|(i, _)| *i as u64),
    ))];

    let mut push = |name: &str, nullable: bool, array: ArrayRef| {
        fields.push(Field::new(name, array.data_type().clone(), nullable));
        arrays.push(array);
    };

    push(START_TIME, false, strings(rows, |t| Some(t.start_time.format(TIME_FORMAT).to_string())));
    push(END_TIME, false, strings(rows, |t| Some(t.end_time.format(TIME_FORMAT).to_string())));
    push(
        TRIP_DURATION,
        false,
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|(_, t)| t.trip_duration))),
    );
    push(START_STATION, false, strings(rows, |t| Some(t.start_station.clone())));
    push(END_STATION, false, strings(rows, |t| Some(t.end_station.clone())));
    push(USER_TYPE, true, strings(rows, |t| t.user_type.clone()));
    if columns.gender {
        push(GENDER, true, strings(rows, |t| t.gender.clone()));
    }
    if columns.birth_year {
        push(
            BIRTH_YEAR,
            true,
            Arc::new(rows.iter().map(|(_, t)| t.birth_year).collect::<Int32Array>()),
        );
    }
    push(
        "month",
        false,
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|(_, t)| t.month()))),
    );
    push("day_of_week", false, strings(rows, |t| Some(weekday_name(t.weekday()).to_string())));

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building page batch")?;
    let table = pretty_format_batches(&[batch]).context("formatting page")?;
    Ok(table.to_string())
}

fn strings(rows: &[(usize, &TripRecord)], value: impl Fn(&TripRecord) -> Option<String>) -> ArrayRef {
    Arc::new(rows.iter().map(|(_, t)| value(t)).collect::<StringArray>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dataset, trip};

    fn twelve_trips() -> crate::data::model::Dataset {
        dataset(
            (0..12)
                .map(|i| trip(&format!("2017-04-{:02} 08:00:00", i + 1), &format!("S{i}"), "End", 60.0))
                .collect(),
        )
    }

    #[test]
    fn pages_advance_by_five_and_end_partial() {
        let ds = twelve_trips();
        let view = FilteredView::all(&ds);
        let mut pager = RowPager::default();

        let idx = |rows: Vec<(usize, &TripRecord)>| rows.into_iter().map(|(i, _)| i).collect::<Vec<_>>();
        assert_eq!(idx(pager.next_page(&view)), vec![0, 1, 2, 3, 4]);
        assert_eq!(idx(pager.next_page(&view)), vec![5, 6, 7, 8, 9]);
        assert_eq!(idx(pager.next_page(&view)), vec![10, 11]);
        assert!(pager.next_page(&view).is_empty());
    }

    #[test]
    fn pages_keep_dataset_index_of_filtered_rows() {
        let ds = twelve_trips();
        let view = FilteredView {
            dataset: &ds,
            indices: vec![3, 7, 11],
        };
        let rows = RowPager::default().next_page(&view);
        assert_eq!(rows.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![3, 7, 11]);
    }

    #[test]
    fn three_yes_answers_show_three_pages() {
        let ds = twelve_trips();
        let view = FilteredView::all(&ds);
        let mut console = Console::new("yes\nyes\nyes\nno\n".as_bytes(), Vec::new());

        display_data(&mut console, &view).unwrap();

        let out = String::from_utf8(console.out().clone()).unwrap();
        assert!(out.contains("| S0 "));
        assert!(out.contains("| S9 "));
        assert!(out.contains("| S11 "));
        assert_eq!(out.matches("Do you wish to continue?").count(), 3);
    }

    #[test]
    fn no_answer_shows_nothing() {
        let ds = twelve_trips();
        let view = FilteredView::all(&ds);
        let mut console = Console::new("No\n".as_bytes(), Vec::new());

        display_data(&mut console, &view).unwrap();

        let out = String::from_utf8(console.out().clone()).unwrap();
        assert!(!out.contains("Start Station"));
    }

    #[test]
    fn table_has_optional_and_derived_columns() {
        let ds = twelve_trips();
        let view = FilteredView::all(&ds);
        let rows = view.rows(0..1);

        let plain = render_rows(&rows, Columns::default()).unwrap();
        assert!(plain.contains("day_of_week"));
        assert!(plain.contains("Saturday")); // 2017-04-01
        assert!(!plain.contains(GENDER));

        let full = render_rows(&rows, Columns { gender: true, birth_year: true }).unwrap();
        assert!(full.contains(GENDER));
        assert!(full.contains(BIRTH_YEAR));
    }
}
