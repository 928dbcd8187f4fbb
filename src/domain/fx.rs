//! Core FX rate types.
//!
//! A [`RateSeries`] is always sorted ascending by date with one observation per
//! date. Positivity is enforced by the cleaner, not by construction, so that a
//! freshly downloaded series can be persisted exactly as the service returned it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Strict column list of raw and processed rate tables.
pub const RAW_COLUMNS: [&str; 2] = ["date", "rate"];

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
pub const WIRE_DATE_FORMAT: &str = "%d/%m/%Y";

/// One daily USD/local-currency observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub rate: f64,
}

impl RateObservation {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// Date-ordered, date-unique rate history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSeries {
    observations: Vec<RateObservation>,
}

impl RateSeries {
    /// Sorts ascending by date and keeps the last occurrence of each date.
    ///
    /// The sort is stable, so "last" means last in input order.
    pub fn normalized(mut observations: Vec<RateObservation>) -> Self {
        observations.sort_by_key(|o| o.date);

        let mut unique: Vec<RateObservation> = Vec::with_capacity(observations.len());
        for obs in observations {
            match unique.last_mut() {
                Some(last) if last.date == obs.date => *last = obs,
                _ => unique.push(obs),
            }
        }

        Self {
            observations: unique,
        }
    }

    pub fn observations(&self) -> &[RateObservation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<RateObservation> {
        self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Untyped view, the shape a freshly read file has before cleaning.
    pub fn to_frame(&self) -> RawFrame {
        RawFrame {
            columns: RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: self
                .observations
                .iter()
                .map(|o| {
                    vec![
                        Some(o.date.format(ISO_DATE_FORMAT).to_string()),
                        Some(o.rate.to_string()),
                    ]
                })
                .collect(),
        }
    }
}

/// A downloaded series plus the range the caller asked for
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub series: RateSeries,
    pub requested_start: String,
    pub requested_end: String,
}

/// Untyped tabular data as read from a delimited file.
///
/// Cells are `None` when empty. Column names are kept in file order so that
/// strict-schema checks can detect extra, missing and reordered columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawFrame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Provenance sidecar written next to every raw snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub source_name: String,
    pub source_endpoint: String,
    pub soap_action: String,
    /// `YYYY-MM-DDTHH:MM:SSZ`
    pub retrieved_at_utc: String,
    pub requested_start_date: String,
    pub requested_end_date: String,
    pub row_count: usize,
    pub min_date: String,
    pub max_date: String,
    pub schema: Vec<String>,
    /// Hex SHA-256 of the snapshot file bytes
    pub sha256: String,
}

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).ok()
}
