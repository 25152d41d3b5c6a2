use std::io::{BufRead, Write};

use anyhow::Result;
use log::{error, info};

use crate::config::{City, CityTable};
use crate::data::filter::filtered_view;
use crate::data::loader::load_data;
use crate::data::model::{DAY_CHOICES, FilterSelection, FilteredView, MONTH_CHOICES};
use crate::pager::display_data;
use crate::prompt::{Console, PromptError};
use crate::stats::{DurationStats, SEPARATOR, StationStats, TimeStats, UserStats, print_report};

// ---------------------------------------------------------------------------
// Interactive session
// ---------------------------------------------------------------------------

pub struct BikeshareApp {
    cities: CityTable,
}

impl BikeshareApp {
    pub fn new(cities: CityTable) -> Self {
        Self { cities }
    }

    /// Run sessions until the user declines to restart. Closed input ends
    /// the program normally after telling the user.
    pub fn run<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        match self.session_loop(console) {
            Err(err) if matches!(err.downcast_ref::<PromptError>(), Some(PromptError::InputUnavailable)) => {
                info!("input closed, ending session");
                writeln!(console.out(), "\nThere seems to be an issue with your input.")?;
                Ok(())
            }
            other => other,
        }
    }

    fn session_loop<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        loop {
            let selection = get_filters(console)?;
            info!("selection: {selection}");

            // The dataset lives for this iteration only.
            match load_data(&self.cities, selection.city) {
                Ok(dataset) => {
                    let view = filtered_view(&dataset, &selection);
                    info!("{} of {} trips match", view.len(), dataset.len());
                    print_statistics(&view, console.out())?;
                    display_data(console, &view)?;
                }
                Err(err) => {
                    error!("{err:#}");
                    writeln!(console.out(), "Could not load data for {}: {err:#}", selection.city)?;
                }
            }

            if !console.confirm("\nWould you like to restart? Enter yes or no: ")? {
                return Ok(());
            }
        }
    }
}

/// Ask for city, month and day.
pub fn get_filters<R: BufRead, W: Write>(console: &mut Console<R, W>) -> Result<FilterSelection> {
    writeln!(console.out(), "Hello! Let's explore some US bikeshare data!")?;
    let city = console.prompt_choice(
        "Choose one of the 3 cities (chicago, new york city, washington): ",
        &City::CHOICES,
    )?;
    let month = console.prompt_choice("Choose a month (all, january, february, ... , june): ", &MONTH_CHOICES)?;
    let day = console.prompt_choice("Choose a day (all, monday, tuesday, ... sunday): ", &DAY_CHOICES)?;
    writeln!(console.out(), "{SEPARATOR}")?;

    FilterSelection::from_choices(&city, &month, &day)
}

/// All four reports, in fixed order.
pub fn print_statistics(view: &FilteredView<'_>, out: &mut impl Write) -> std::io::Result<()> {
    print_report::<TimeStats>(view, out)?;
    print_report::<StationStats>(view, out)?;
    print_report::<DurationStats>(view, out)?;
    print_report::<UserStats>(view, out)
}
