use super::model::{Dataset, FilterSelection, FilteredView, TripRecord};

// ---------------------------------------------------------------------------
// Month / weekday predicates
// ---------------------------------------------------------------------------

/// Whether a trip passes the month and day filters of `selection`.
/// An unset filter passes every trip.
pub fn matches(trip: &TripRecord, selection: &FilterSelection) -> bool {
    if let Some(month) = selection.month {
        if trip.month() != month.number_from_month() {
            return false;
        }
    }
    if let Some(day) = selection.day {
        if trip.weekday() != day {
            return false;
        }
    }
    true
}

/// Return the view of trips that pass the selection, in dataset order.
pub fn filtered_view<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> FilteredView<'a> {
    let indices = dataset
        .trips
        .iter()
        .enumerate()
        .filter(|(_, trip)| matches(trip, selection))
        .map(|(i, _)| i)
        .collect();
    FilteredView { dataset, indices }
}
