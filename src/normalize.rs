//! normalize.rs
//!
//! Maps raw catalogue rows and the population record into uniform
//! `MetricRecord`s with display-ready value and date strings.

use crate::errors::MetricsError;
use crate::population::PopulationRecord;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One row as returned by the data catalogue API.
pub type RawRecord = Map<String, Value>;

/// Display name of the population metric; always the first output record.
pub const POPULATION_DATASET: &str = "Population";

/// A formatted metric, ready for any of the writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricRecord {
    pub dataset: String,
    pub value: String,
    pub date_format: String,
}

/// Metric type tag: which value field a record carries, and therefore how it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// GDP growth, field `value`
    Value,
    IncomeMedian,
    InflationYoy,
    URate,
    Population,
}

impl MetricType {
    /// Field names probed on API records, in priority order.
    const API_TAGS: [MetricType; 4] = [
        MetricType::Value,
        MetricType::IncomeMedian,
        MetricType::InflationYoy,
        MetricType::URate,
    ];

    pub fn field_name(self) -> &'static str {
        match self {
            MetricType::Value => "value",
            MetricType::IncomeMedian => "income_median",
            MetricType::InflationYoy => "inflation_yoy",
            MetricType::URate => "u_rate",
            MetricType::Population => "population",
        }
    }

    /// Detect the tag of an API record. Lookup is by key, so the record's
    /// own field order is irrelevant.
    pub fn detect(record: &RawRecord) -> Option<(MetricType, &Value)> {
        Self::API_TAGS
            .iter()
            .find_map(|tag| record.get(tag.field_name()).map(|v| (*tag, v)))
    }
}

/// Quarter (1..=4) of a calendar month.
pub fn quarter_of(month: u32) -> u32 {
    (month + 2) / 3
}

/// Format a date for display according to the metric type.
pub fn format_date(date: NaiveDate, kind: MetricType) -> String {
    match kind {
        MetricType::InflationYoy => date.format("%b %Y").to_string(),
        MetricType::URate => format!("Q{} {}", quarter_of(date.month()), date.year()),
        MetricType::Population | MetricType::Value | MetricType::IncomeMedian => {
            date.format("%Y").to_string()
        }
    }
}

/// Format a value for display according to the metric type.
pub fn format_value(value: f64, kind: MetricType) -> String {
    match kind {
        MetricType::Population => format!("{:.2}mil", value / 1000.0),
        // ties to even
        MetricType::IncomeMedian => format!("RM{}", group_thousands(value.round_ties_even() as i64)),
        MetricType::Value | MetricType::InflationYoy | MetricType::URate => {
            format!("{:.2}%", value)
        }
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Parse an ISO `YYYY-MM-DD` date, tolerating a trailing time component.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Format the population record.
pub fn population_metric(population: &PopulationRecord) -> MetricRecord {
    MetricRecord {
        dataset: POPULATION_DATASET.to_string(),
        value: format_value(population.population, MetricType::Population),
        date_format: format_date(population.date, MetricType::Population),
    }
}

/// Format the first row of one API response.
///
/// Returns `Ok(None)` when the response is empty or the row carries none of
/// the known value fields; the metric is then left out of the output.
pub fn api_metric(dataset: &str, rows: &[RawRecord]) -> Result<Option<MetricRecord>, MetricsError> {
    let Some(record) = rows.first() else {
        warn!(dataset, "Empty API response, skipping metric");
        return Ok(None);
    };

    let malformed = |reason: String| MetricsError::MalformedRecord {
        dataset: dataset.to_string(),
        reason,
    };

    let raw_date = record
        .get("date")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing `date` field".to_string()))?;
    let date = parse_iso_date(raw_date)
        .ok_or_else(|| malformed(format!("unparseable date {raw_date:?}")))?;

    let Some((kind, raw_value)) = MetricType::detect(record) else {
        warn!(dataset, "No known value field in record, skipping metric");
        return Ok(None);
    };
    let value = raw_value.as_f64().ok_or_else(|| {
        malformed(format!("`{}` is not numeric: {raw_value}", kind.field_name()))
    })?;

    debug!(dataset, tag = kind.field_name(), value, %date, "Normalized metric");

    Ok(Some(MetricRecord {
        dataset: dataset.to_string(),
        value: format_value(value, kind),
        date_format: format_date(date, kind),
    }))
}

/// Build the ordered record list: population first, then each API metric in
/// the order given, skipping the ones that yield nothing.
pub fn normalize<'a, I>(population: &PopulationRecord, responses: I) -> Result<Vec<MetricRecord>, MetricsError>
where
    I: IntoIterator<Item = (&'a str, &'a [RawRecord])>,
{
    let mut records = vec![population_metric(population)];
    for (dataset, rows) in responses {
        if let Some(record) = api_metric(dataset, rows)? {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn value_formats_follow_metric_type() {
        assert_eq!(format_value(5432.0, MetricType::IncomeMedian), "RM5,432");
        assert_eq!(format_value(3.14159, MetricType::Value), "3.14%");
        assert_eq!(format_value(1_715_700.0, MetricType::Population), "1715.70mil");
        assert_eq!(format_value(1.8, MetricType::InflationYoy), "1.80%");
        assert_eq!(format_value(-0.456, MetricType::URate), "-0.46%");
    }

    #[test]
    fn income_grouping_handles_widths_and_rounding() {
        assert_eq!(format_value(999.0, MetricType::IncomeMedian), "RM999");
        assert_eq!(format_value(1000.0, MetricType::IncomeMedian), "RM1,000");
        assert_eq!(format_value(7_654_321.4, MetricType::IncomeMedian), "RM7,654,321");
        assert_eq!(format_value(123_456.6, MetricType::IncomeMedian), "RM123,457");
        assert_eq!(format_value(-2500.0, MetricType::IncomeMedian), "RM-2,500");
    }

    #[test]
    fn income_halves_round_to_even() {
        assert_eq!(format_value(5432.5, MetricType::IncomeMedian), "RM5,432");
        assert_eq!(format_value(5433.5, MetricType::IncomeMedian), "RM5,434");
        assert_eq!(format_value(2.5, MetricType::IncomeMedian), "RM2");
        assert_eq!(format_value(-1500.5, MetricType::IncomeMedian), "RM-1,500");
    }

    #[test]
    fn date_formats_follow_metric_type() {
        let d = date(2024, 8, 1);
        assert_eq!(format_date(d, MetricType::Value), "2024");
        assert_eq!(format_date(d, MetricType::IncomeMedian), "2024");
        assert_eq!(format_date(d, MetricType::Population), "2024");
        assert_eq!(format_date(d, MetricType::InflationYoy), "Aug 2024");
        assert_eq!(format_date(d, MetricType::URate), "Q3 2024");
    }

    #[test]
    fn every_month_lands_in_its_quarter() {
        let months = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        for (idx, name) in months.iter().enumerate() {
            let d = NaiveDate::parse_from_str(&format!("1 {name} 2023"), "%d %B %Y").unwrap();
            let expected = format!("Q{} 2023", idx / 3 + 1);
            assert_eq!(format_date(d, MetricType::URate), expected, "month {name}");
        }
    }

    #[test]
    fn detection_ignores_field_order() {
        let a = record(json!({"date": "2024-06-01", "inflation_yoy": 2.1}));
        let b = record(json!({"inflation_yoy": 2.1, "date": "2024-06-01"}));

        let ma = api_metric("CPI", &[a]).unwrap();
        let mb = api_metric("CPI", &[b]).unwrap();
        assert_eq!(ma, mb);
        assert_eq!(ma.unwrap().date_format, "Jun 2024");
    }

    #[test]
    fn record_without_known_field_is_skipped() {
        let rows = [record(json!({"date": "2024-01-01", "mystery": 4.2}))];
        assert_eq!(api_metric("Mystery", &rows).unwrap(), None);
        assert_eq!(api_metric("Empty", &[]).unwrap(), None);
    }

    #[test]
    fn missing_date_is_an_error() {
        let rows = [record(json!({"u_rate": 2.0}))];
        let err = api_metric("Unemployment rate", &rows).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedRecord { .. }));
    }

    #[test]
    fn non_numeric_value_is_an_error() {
        let rows = [record(json!({"date": "2024-01-01", "value": null}))];
        assert!(api_metric("GDP growth", &rows).is_err());
    }

    #[test]
    fn population_always_comes_first() {
        let population = PopulationRecord {
            date: date(2024, 1, 1),
            population: 1_790.3,
        };
        let unemployment = [record(json!({"date": "2024-04-01", "u_rate": 2.1}))];
        let skipped = [record(json!({"date": "2024-04-01"}))];
        let gdp = [record(json!({"value": 5.04, "date": "2023-01-01"}))];

        let records = normalize(
            &population,
            [
                ("Unemployment rate", &unemployment[..]),
                ("Nothing", &skipped[..]),
                ("GDP growth", &gdp[..]),
            ],
        )
        .unwrap();

        let names: Vec<_> = records.iter().map(|r| r.dataset.as_str()).collect();
        assert_eq!(names, ["Population", "Unemployment rate", "GDP growth"]);
        assert_eq!(records[0].value, "1.79mil");
        assert_eq!(records[1].date_format, "Q2 2024");
        assert_eq!(records[2].value, "5.04%");
    }
}
