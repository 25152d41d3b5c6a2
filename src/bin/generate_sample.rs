use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use log::info;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Write synthetic bikeshare trip files for the three supported cities.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory receiving chicago.csv, new_york_city.csv and washington.csv
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Trips per city
    #[arg(long, default_value_t = 2000)]
    rows: usize,

    /// Random seed, so repeated runs produce identical files
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also write a .parquet file next to each .csv
    #[arg(long)]
    parquet: bool,
}

struct CitySpec {
    file_stem: &'static str,
    stations: &'static [&'static str],
    demographics: bool,
}

const CITIES: [CitySpec; 3] = [
    CitySpec {
        file_stem: "chicago",
        stations: &[
            "Streeter Dr & Grand Ave",
            "Lake Shore Dr & Monroe St",
            "Clinton St & Washington Blvd",
            "Canal St & Adams St",
            "Theater on the Lake",
            "Michigan Ave & Oak St",
        ],
        demographics: true,
    },
    CitySpec {
        file_stem: "new_york_city",
        stations: &[
            "Pershing Square North",
            "E 17 St & Broadway",
            "W 21 St & 6 Ave",
            "West St & Chambers St",
            "Broadway & E 22 St",
            "8 Ave & W 31 St",
        ],
        demographics: true,
    },
    CitySpec {
        file_stem: "washington",
        stations: &[
            "Columbus Circle / Union Station",
            "Lincoln Memorial",
            "Jefferson Dr & 14th St SW",
            "Massachusetts Ave & Dupont Circle NW",
            "15th & P St NW",
            "Smithsonian-National Mall / Jefferson Dr & 12th St SW",
        ],
        demographics: false,
    },
];

/// One generated trip, in the column order of the real exports.
struct Trip {
    start: NaiveDateTime,
    end: NaiveDateTime,
    duration: i64,
    start_station: &'static str,
    end_station: &'static str,
    user_type: &'static str,
    gender: Option<&'static str>,
    birth_year: Option<i64>,
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn generate_trips(city: &CitySpec, rows: usize, rng: &mut StdRng) -> Result<Vec<Trip>> {
    let first_day = NaiveDate::from_ymd_opt(2017, 1, 1).context("invalid first day")?;
    // January through June 2017.
    let days = 181;

    (0..rows)
        .map(|_| {
            let day = first_day + Duration::days(rng.gen_range(0..days));
            // Commute peaks at 8:00 and 17:00, otherwise uniform.
            let hour = match rng.gen_range(0..10) {
                0..=2 => 8,
                3..=5 => 17,
                _ => rng.gen_range(0..24),
            };
            let start = day
                .and_hms_opt(hour, rng.gen_range(0..60), rng.gen_range(0..60))
                .context("invalid start time")?;
            let duration = rng.gen_range(60..3600);

            // Skew toward the first stations so the popular ones stand out.
            let pick = |rng: &mut StdRng| {
                let i = rng.gen_range(0..city.stations.len());
                let j = rng.gen_range(0..city.stations.len());
                city.stations[i.min(j)]
            };
            let start_station = pick(rng);
            let end_station = pick(rng);

            let subscriber = rng.gen_bool(0.8);
            let (gender, birth_year) = if city.demographics && subscriber {
                let gender = if rng.gen_bool(0.7) { "Male" } else { "Female" };
                (Some(gender), Some(rng.gen_range(1940..2002)))
            } else {
                (None, None)
            };

            Ok(Trip {
                start,
                end: start + Duration::seconds(duration),
                duration,
                start_station,
                end_station,
                user_type: if subscriber { "Subscriber" } else { "Customer" },
                gender,
                birth_year,
            })
        })
        .collect()
}

fn write_csv(path: &Path, trips: &[Trip], demographics: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["", "Start Time", "End Time", "Trip Duration", "Start Station", "End Station", "User Type"];
    if demographics {
        header.extend(["Gender", "Birth Year"]);
    }
    writer.write_record(&header)?;

    for (i, trip) in trips.iter().enumerate() {
        let mut record = vec![
            i.to_string(),
            trip.start.format(TIME_FORMAT).to_string(),
            trip.end.format(TIME_FORMAT).to_string(),
            trip.duration.to_string(),
            trip.start_station.to_string(),
            trip.end_station.to_string(),
            trip.user_type.to_string(),
        ];
        if demographics {
            record.push(trip.gender.unwrap_or_default().to_string());
            // Blanks force a float column, as in the real exports.
            record.push(trip.birth_year.map(|y| format!("{y}.0")).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, trips: &[Trip], demographics: bool) -> Result<()> {
    let times = |f: fn(&Trip) -> NaiveDateTime| {
        Arc::new(StringArray::from_iter_values(trips.iter().map(|t| f(t).format(TIME_FORMAT).to_string()))) as ArrayRef
    };

    let mut fields = vec![
        Field::new("Start Time", DataType::Utf8, false),
        Field::new("End Time", DataType::Utf8, false),
        Field::new("Trip Duration", DataType::Int64, false),
        Field::new("Start Station", DataType::Utf8, false),
        Field::new("End Station", DataType::Utf8, false),
        Field::new("User Type", DataType::Utf8, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        times(|t| t.start),
        times(|t| t.end),
        Arc::new(Int64Array::from_iter_values(trips.iter().map(|t| t.duration))),
        Arc::new(StringArray::from_iter_values(trips.iter().map(|t| t.start_station))),
        Arc::new(StringArray::from_iter_values(trips.iter().map(|t| t.end_station))),
        Arc::new(StringArray::from_iter_values(trips.iter().map(|t| t.user_type))),
    ];
    if demographics {
        fields.push(Field::new("Gender", DataType::Utf8, true));
        fields.push(Field::new("Birth Year", DataType::Float64, true));
        columns.push(Arc::new(trips.iter().map(|t| t.gender).collect::<StringArray>()));
        columns.push(Arc::new(
            trips.iter().map(|t| t.birth_year.map(|y| y as f64)).collect::<Float64Array>(),
        ));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    for city in &CITIES {
        let trips = generate_trips(city, args.rows, &mut rng)?;

        let csv_path = args.out_dir.join(format!("{}.csv", city.file_stem));
        write_csv(&csv_path, &trips, city.demographics)?;
        info!("wrote {}", csv_path.display());

        if args.parquet {
            let parquet_path = args.out_dir.join(format!("{}.parquet", city.file_stem));
            write_parquet(&parquet_path, &trips, city.demographics)?;
            info!("wrote {}", parquet_path.display());
        }
    }

    println!(
        "Wrote {} trips for each of {} cities to {}",
        args.rows,
        CITIES.len(),
        args.out_dir.display()
    );
    Ok(())
}
