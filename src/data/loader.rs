use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, TimeUnit, TimestampSecondType};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Columns, Dataset, TripRecord};
use crate::config::{City, CityTable};

pub const START_TIME: &str = "Start Time";
pub const END_TIME: &str = "End Time";
pub const START_STATION: &str = "Start Station";
pub const END_STATION: &str = "End Station";
pub const TRIP_DURATION: &str = "Trip Duration";
pub const USER_TYPE: &str = "User Type";
pub const GENDER: &str = "Gender";
pub const BIRTH_YEAR: &str = "Birth Year";

const REQUIRED: [&str; 6] = [START_TIME, END_TIME, START_STATION, END_STATION, TRIP_DURATION, USER_TYPE];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the full dataset for `city` from the path in `table`.
pub fn load_data(table: &CityTable, city: City) -> Result<Dataset> {
    let path = table.path(city);
    info!("loading {city} trips from {}", path.display());
    let dataset = load_file(path).with_context(|| format!("loading {city} data from {}", path.display()))?;
    debug!(
        "loaded {} trips (gender: {}, birth year: {})",
        dataset.len(),
        dataset.columns.gender,
        dataset.columns.birth_year
    );
    Ok(dataset)
}

/// Load a trip dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one trip per line (extra columns are ignored)
/// * `.json`    – `[{ "Start Time": "...", "Trip Duration": 300, ... }, ...]`
/// * `.parquet` – one column per field, strings or native timestamps
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS`, optionally with fractional seconds, a `T`
/// separator or a trailing UTC `Z`.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .with_context(|| format!("'{s}' is not a timestamp"))
}

// ---------------------------------------------------------------------------
// Row shape shared by the CSV and JSON loaders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
    #[serde(rename = "Start Station")]
    start_station: String,
    #[serde(rename = "End Station")]
    end_station: String,
    #[serde(rename = "Trip Duration")]
    trip_duration: f64,
    #[serde(rename = "User Type")]
    user_type: Option<String>,
    #[serde(rename = "Gender", default)]
    gender: Option<String>,
    /// Exported as float (`1989.0`) wherever the column has blanks.
    #[serde(rename = "Birth Year", default)]
    birth_year: Option<f64>,
}

impl TripRow {
    fn into_record(self, row: usize) -> Result<TripRecord> {
        Ok(TripRecord {
            start_time: parse_timestamp(&self.start_time)
                .with_context(|| format!("Row {row}: bad '{START_TIME}'"))?,
            end_time: parse_timestamp(&self.end_time)
                .with_context(|| format!("Row {row}: bad '{END_TIME}'"))?,
            start_station: self.start_station,
            end_station: self.end_station,
            trip_duration: self.trip_duration,
            user_type: non_blank(self.user_type),
            gender: non_blank(self.gender),
            birth_year: self.birth_year.filter(|y| y.is_finite()).map(|y| y as i32),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn check_required(mut present: impl FnMut(&str) -> bool, source: &str) -> Result<Columns> {
    for col in REQUIRED {
        if !present(col) {
            bail!("{source} missing '{col}' column");
        }
    }
    Ok(Columns {
        gender: present(GENDER),
        birth_year: present(BIRTH_YEAR),
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; the leading unnamed index
/// column written by dataframe exports is ignored along with any other
/// unknown column. Empty cells in optional columns become `None`.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let columns = check_required(|col| headers.iter().any(|h| h == col), "CSV")?;

    let mut trips = Vec::new();
    for (row_no, result) in reader.deserialize::<TripRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        trips.push(row.into_record(row_no)?);
    }

    Ok(Dataset::new(trips, columns))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records',
/// date_format='iso')`):
///
/// ```json
/// [
///   {
///     "Start Time": "2017-06-23 15:09:32",
///     "End Time": "2017-06-23 15:14:53",
///     "Trip Duration": 321,
///     "Start Station": "Wood St & Hubbard St",
///     "End Station": "Damen Ave & Chicago Ave",
///     "User Type": "Subscriber",
///     "Gender": "Male",
///     "Birth Year": 1992.0
///   },
///   ...
/// ]
/// ```
///
/// Optional columns count as present when the first record has the key.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let columns = match records.first() {
        Some(first) => {
            let obj = first.as_object().context("Row 0 is not a JSON object")?;
            check_required(|col| obj.contains_key(col), "JSON")?
        }
        None => Columns::default(),
    };

    let mut trips = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let row = TripRow::deserialize(rec).with_context(|| format!("Row {i}"))?;
        trips.push(row.into_record(i)?);
    }

    Ok(Dataset::new(trips, columns))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of trips.
///
/// Each field is one column. Time columns may be strings or any
/// timestamp unit; numeric columns may be any integer or float type.
/// Every column is cast to a canonical type before reading values.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let columns = check_required(|col| schema.index_of(col).is_ok(), "Parquet file")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut trips = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, columns, trips.len(), &mut trips)?;
    }

    Ok(Dataset::new(trips, columns))
}

// -- Parquet / Arrow helpers --

fn read_batch(batch: &RecordBatch, columns: Columns, first_row: usize, out: &mut Vec<TripRecord>) -> Result<()> {
    let timestamp = DataType::Timestamp(TimeUnit::Second, None);

    let start_time = column_as(batch, START_TIME, &timestamp)?;
    let end_time = column_as(batch, END_TIME, &timestamp)?;
    let start_station = column_as(batch, START_STATION, &DataType::Utf8)?;
    let end_station = column_as(batch, END_STATION, &DataType::Utf8)?;
    let trip_duration = column_as(batch, TRIP_DURATION, &DataType::Float64)?;
    let user_type = column_as(batch, USER_TYPE, &DataType::Utf8)?;
    let gender = columns
        .gender
        .then(|| column_as(batch, GENDER, &DataType::Utf8))
        .transpose()?;
    let birth_year = columns
        .birth_year
        .then(|| column_as(batch, BIRTH_YEAR, &DataType::Float64))
        .transpose()?;

    let start_time = start_time.as_primitive::<TimestampSecondType>();
    let end_time = end_time.as_primitive::<TimestampSecondType>();
    let trip_duration = trip_duration.as_primitive::<Float64Type>();

    for row in 0..batch.num_rows() {
        let row_no = first_row + row;
        out.push(TripRecord {
            start_time: start_time
                .value_as_datetime(row)
                .filter(|_| start_time.is_valid(row))
                .with_context(|| format!("Row {row_no}: missing '{START_TIME}'"))?,
            end_time: end_time
                .value_as_datetime(row)
                .filter(|_| end_time.is_valid(row))
                .with_context(|| format!("Row {row_no}: missing '{END_TIME}'"))?,
            start_station: string_at(&start_station, row).unwrap_or_default(),
            end_station: string_at(&end_station, row).unwrap_or_default(),
            trip_duration: trip_duration
                .is_valid(row)
                .then(|| trip_duration.value(row))
                .with_context(|| format!("Row {row_no}: missing '{TRIP_DURATION}'"))?,
            user_type: string_at(&user_type, row),
            gender: gender.as_ref().and_then(|col| string_at(col, row)),
            birth_year: birth_year.as_ref().and_then(|col| {
                let col = col.as_primitive::<Float64Type>();
                col.is_valid(row)
                    .then(|| col.value(row))
                    .filter(|y| y.is_finite())
                    .map(|y| y as i32)
            }),
        });
    }
    Ok(())
}

/// Fetch a named column cast to `to`.
fn column_as(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef> {
    let col = batch
        .column_by_name(name)
        .with_context(|| format!("Parquet batch missing '{name}' column"))?;
    cast(col.as_ref(), to).with_context(|| format!("column '{name}' cannot be read as {to:?}"))
}

/// Extract a non-blank string from a Utf8 column at the given row.
fn string_at(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let value = col.as_string::<i32>().value(row);
    (!value.trim().is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use chrono::{Datelike, Timelike, Weekday};
    use parquet::arrow::ArrowWriter;

    use super::*;

    const CHICAGO_CSV: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type,Gender,Birth Year
1423854,2017-06-23 15:09:32,2017-06-23 15:14:53,321,Wood St & Hubbard St,Damen Ave & Chicago Ave,Subscriber,Male,1992.0
955915,2017-05-25 18:19:03,2017-05-25 18:45:53,1610,Theater on the Lake,Sheffield Ave & Waveland Ave,Subscriber,Female,1992.0
9031,2017-01-04 08:27:49,2017-01-04 08:34:45,416,May St & Taylor St,Wood St & Taylor St,Customer,,
";

    const WASHINGTON_CSV: &str = "\
,Start Time,End Time,Trip Duration,Start Station,End Station,User Type
1621326,2017-06-21 08:36:34,2017-06-21 08:44:43,489.066,14th & Belmont St NW,15th & K St NW,Subscriber
";

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_with_demographics() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "chicago.csv", CHICAGO_CSV);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.columns, Columns { gender: true, birth_year: true });

        let first = &ds.trips[0];
        assert_eq!(first.month(), 6);
        assert_eq!(first.weekday(), Weekday::Fri);
        assert_eq!(first.hour(), 15);
        assert_eq!(first.trip_duration, 321.0);
        assert_eq!(first.gender.as_deref(), Some("Male"));
        assert_eq!(first.birth_year, Some(1992));

        let blank = &ds.trips[2];
        assert_eq!(blank.gender, None);
        assert_eq!(blank.birth_year, None);
        assert_eq!(blank.user_type.as_deref(), Some("Customer"));
    }

    #[test]
    fn csv_without_demographic_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "washington.csv", WASHINGTON_CSV);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.columns, Columns::default());
        assert!((ds.trips[0].trip_duration - 489.066).abs() < 1e-9);
    }

    #[test]
    fn csv_missing_required_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", "Start Time,End Time\n2017-01-01 00:00:00,2017-01-01 00:01:00\n");

        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Start Station"), "{err:#}");
    }

    #[test]
    fn csv_bad_timestamp_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "bad.csv",
            "Start Time,End Time,Trip Duration,Start Station,End Station,User Type\nyesterday,2017-01-01 00:01:00,60,A,B,Customer\n",
        );

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Row 0"), "{err:#}");
    }

    #[test]
    fn json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "trips.json",
            r#"[
              {"Start Time": "2017-03-05T10:00:00.000Z", "End Time": "2017-03-05T10:30:00.000Z",
               "Trip Duration": 1800, "Start Station": "A", "End Station": "B",
               "User Type": "Subscriber", "Gender": "Female", "Birth Year": null}
            ]"#,
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.columns, Columns { gender: true, birth_year: true });
        assert_eq!(ds.trips[0].start_time.hour(), 10);
        assert_eq!(ds.trips[0].birth_year, None);
    }

    #[test]
    fn parquet_with_string_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("washington.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new(START_TIME, DataType::Utf8, false),
            Field::new(END_TIME, DataType::Utf8, false),
            Field::new(TRIP_DURATION, DataType::Int64, false),
            Field::new(START_STATION, DataType::Utf8, false),
            Field::new(END_STATION, DataType::Utf8, false),
            Field::new(USER_TYPE, DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2017-02-14 07:00:00", "2017-02-15 19:30:00"])),
                Arc::new(StringArray::from(vec!["2017-02-14 07:10:00", "2017-02-15 19:45:00"])),
                Arc::new(Int64Array::from(vec![600, 900])),
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(StringArray::from(vec!["B", "A"])),
                Arc::new(StringArray::from(vec![Some("Subscriber"), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns, Columns::default());
        assert_eq!(ds.trips[0].start_time.day(), 14);
        assert_eq!(ds.trips[1].trip_duration, 900.0);
        assert_eq!(ds.trips[1].user_type, None);
    }

    fn write_parquet(path: &Path, durations: Vec<Option<f64>>, birth_years: Vec<f64>) {
        let n = durations.len();
        let schema = Arc::new(Schema::new(vec![
            Field::new(START_TIME, DataType::Utf8, false),
            Field::new(END_TIME, DataType::Utf8, false),
            Field::new(TRIP_DURATION, DataType::Float64, true),
            Field::new(START_STATION, DataType::Utf8, false),
            Field::new(END_STATION, DataType::Utf8, false),
            Field::new(USER_TYPE, DataType::Utf8, false),
            Field::new(BIRTH_YEAR, DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2017-02-14 07:00:00"; n])),
                Arc::new(StringArray::from(vec!["2017-02-14 07:10:00"; n])),
                Arc::new(Float64Array::from(durations)),
                Arc::new(StringArray::from(vec!["A"; n])),
                Arc::new(StringArray::from(vec!["B"; n])),
                Arc::new(StringArray::from(vec!["Subscriber"; n])),
                Arc::new(Float64Array::from(birth_years)),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn parquet_nan_birth_year_is_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chicago.parquet");
        write_parquet(&path, vec![Some(600.0), Some(300.0)], vec![1980.0, f64::NAN]);

        let ds = load_file(&path).unwrap();
        assert!(ds.columns.birth_year);
        assert_eq!(ds.trips[0].birth_year, Some(1980));
        assert_eq!(ds.trips[1].birth_year, None);
    }

    #[test]
    fn parquet_null_duration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chicago.parquet");
        write_parquet(&path, vec![Some(600.0), None], vec![1980.0, 1990.0]);

        let err = load_file(&path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Row 1"), "{message}");
        assert!(message.contains(TRIP_DURATION), "{message}");
    }

    #[test]
    fn timestamps_with_utc_suffix() {
        let ts = parse_timestamp("2017-06-23T15:09:32.000Z").unwrap();
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (15, 9, 32));
        assert!(parse_timestamp("2017-06-23 15:09:32Z").is_ok());
        assert!(parse_timestamp("2017-06-23 15:09:32+02:00").is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("trips.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
