//! population.rs
//!
//! Decodes the state population parquet file and picks the latest row for a
//! single dimension slice.

use crate::errors::MetricsError;
use crate::normalize::parse_iso_date;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate};
use parquet::basic::{LogicalType, TimeUnit};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use parquet::schema::types::SchemaDescriptor;
use tracing::{debug, warn};

/// Latest population figure for the configured slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationRecord {
    pub date: NaiveDate,
    /// Population in thousands, as published.
    pub population: f64,
}

/// Equality predicates applied to every row before the latest date is picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationFilter {
    pub sex: String,
    pub age: String,
    pub ethnicity: String,
    pub state: String,
}

impl Default for PopulationFilter {
    fn default() -> Self {
        PopulationFilter {
            sex: "both".to_string(),
            age: "overall".to_string(),
            ethnicity: "overall".to_string(),
            state: "Pulau Pinang".to_string(),
        }
    }
}

#[derive(Default)]
struct RowView<'a> {
    sex: Option<&'a str>,
    age: Option<&'a str>,
    ethnicity: Option<&'a str>,
    state: Option<&'a str>,
    date: Option<NaiveDate>,
    population: Option<f64>,
}

impl<'a> RowView<'a> {
    fn from_row(row: &'a Row, date_unit: DateUnit) -> Self {
        let mut view = RowView::default();
        for (name, field) in row.get_column_iter() {
            match name.as_str() {
                "sex" => view.sex = field_str(field),
                "age" => view.age = field_str(field),
                "ethnicity" => view.ethnicity = field_str(field),
                "state" => view.state = field_str(field),
                "date" => view.date = field_date(field, date_unit),
                "population" => view.population = field_f64(field),
                _ => {}
            }
        }
        view
    }

    fn matches(&self, filter: &PopulationFilter) -> bool {
        self.sex == Some(filter.sex.as_str())
            && self.age == Some(filter.age.as_str())
            && self.ethnicity == Some(filter.ethnicity.as_str())
            && self.state == Some(filter.state.as_str())
    }
}

fn field_str(field: &Field) -> Option<&str> {
    match field {
        Field::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

/// How an INT64 `date` column is encoded. The row reader only resolves
/// millis/micros timestamps; nanosecond timestamps (pandas' default for
/// `datetime64[ns]`) come through as plain `Long`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateUnit {
    Native,
    Nanos,
}

impl DateUnit {
    fn from_schema(schema: &SchemaDescriptor) -> Self {
        let nanos = schema.columns().iter().any(|col| {
            col.name() == "date"
                && matches!(
                    col.logical_type(),
                    Some(LogicalType::Timestamp { unit: TimeUnit::NANOS(_), .. })
                )
        });
        if nanos {
            DateUnit::Nanos
        } else {
            DateUnit::Native
        }
    }
}

fn field_date(field: &Field, unit: DateUnit) -> Option<NaiveDate> {
    match field {
        Field::Long(ns) if unit == DateUnit::Nanos => Some(DateTime::from_timestamp_nanos(*ns).date_naive()),
        // days since the unix epoch
        Field::Date(days) => NaiveDate::from_num_days_from_ce_opt(719_163 + *days),
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.date_naive()),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us).map(|dt| dt.date_naive()),
        Field::Str(s) => parse_iso_date(s),
        _ => None,
    }
}

fn field_f64(field: &Field) -> Option<f64> {
    match field {
        Field::Double(v) => Some(*v),
        Field::Float(v) => Some(f64::from(*v)),
        Field::Int(v) => Some(f64::from(*v)),
        Field::Long(v) => Some(*v as f64),
        _ => None,
    }
}

/// Scan every row of a parquet file held in memory and return the latest
/// row matching `filter`. Ties on the latest date keep the first row seen.
pub fn latest_population(
    source: &str,
    data: Bytes,
    filter: &PopulationFilter,
) -> Result<PopulationRecord, MetricsError> {
    let parquet_err = |e| MetricsError::Parquet(source.to_string(), e);

    let reader = SerializedFileReader::new(data).map_err(parquet_err)?;
    let file_meta = reader.metadata().file_metadata();
    let total_rows = file_meta.num_rows();
    let date_unit = DateUnit::from_schema(file_meta.schema_descr());

    let mut latest: Option<PopulationRecord> = None;
    let mut matched = 0usize;
    let mut unreadable = 0usize;
    for row in reader.get_row_iter(None).map_err(parquet_err)? {
        let row = row.map_err(parquet_err)?;
        let view = RowView::from_row(&row, date_unit);
        if !view.matches(filter) {
            continue;
        }
        matched += 1;

        let (Some(date), Some(population)) = (view.date, view.population) else {
            unreadable += 1;
            continue;
        };
        if latest.as_ref().map_or(true, |best| date > best.date) {
            latest = Some(PopulationRecord { date, population });
        }
    }

    debug!(source, total_rows, matched, ?date_unit, "Filtered population rows");
    if unreadable > 0 {
        warn!(source, matched, unreadable, "Matching population rows without a readable date or population");
    }
    latest.ok_or_else(|| MetricsError::MissingPopulation(filter.state.clone()))
}
