use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while acquiring the rate history from the remote service
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("{field} must use YYYY-MM-DD format, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("start_date must be earlier than or equal to end_date: {start} > {end}")]
    InvertedRange { start: String, end: String },

    #[error(
        "SOAP request failed after max retries. endpoint={endpoint} range={start}:{end} attempts={attempts} error={last_error}"
    )]
    TransportExhausted {
        endpoint: String,
        start: String,
        end: String,
        attempts: u32,
        last_error: String,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("No FX rows were returned from {endpoint} for the requested range {start} to {end}")]
    EmptyResult {
        endpoint: String,
        start: String,
        end: String,
    },
}

/// Failure of a single HTTP attempt. Always retryable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportFailure {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

/// Errors in a well-formed exchange. Never retried.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid XML returned by SOAP endpoint {endpoint} for range {start} to {end}: {reason}")]
    InvalidXml {
        endpoint: String,
        start: String,
        end: String,
        reason: String,
    },

    #[error("SOAP fault from endpoint {endpoint} for range {start} to {end}: {message}")]
    Fault {
        endpoint: String,
        start: String,
        end: String,
        message: String,
    },

    #[error("Response row {row} missing required fields '{date_field}'/'{rate_field}' for range {start} to {end}")]
    MissingField {
        row: usize,
        date_field: String,
        rate_field: String,
        start: String,
        end: String,
    },

    #[error("Non-parseable date '{value}' in row {row} for range {start} to {end} (expected DD/MM/YYYY)")]
    InvalidDate {
        row: usize,
        value: String,
        start: String,
        end: String,
    },

    #[error("Non-numeric rate '{value}' in row {row} for range {start} to {end}")]
    InvalidRate {
        row: usize,
        value: String,
        start: String,
        end: String,
    },
}

/// Local precondition failures on tables and parameters
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Strict schema required. Columns must be exactly [{expected}], found [{found}]")]
    ColumnMismatch { expected: String, found: String },

    #[error("Schema mismatch. Missing required columns: {missing}")]
    MissingColumns { missing: String },

    #[error("Invalid value '{value}' in column '{column}' at row {row}: {reason}")]
    InvalidType {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    #[error("{table} table is empty after cleaning")]
    Empty { table: &'static str },

    #[error("Rate must be strictly positive: {rate} on {date}")]
    NonPositiveRate { date: String, rate: f64 },

    #[error("Dates must be strictly increasing and unique: {previous} followed by {next}")]
    NotStrictlyIncreasing { previous: String, next: String },

    #[error("Feature table contains {count} missing value(s) in column '{column}'")]
    MissingValues { column: String, count: usize },

    #[error("notional must be > 0, got {0}")]
    InvalidNotional(f64),

    #[error("lags must be a non-empty set of positive integers, got {0:?}")]
    InvalidLags(Vec<usize>),
}

/// Table too small for the requested window
#[derive(Debug, Error, PartialEq)]
pub enum SizingError {
    #[error("Not enough rows for a {test_days}-row test window: table has {rows} rows")]
    InsufficientRows { rows: usize, test_days: usize },

    #[error("test_days must be at least 1")]
    EmptyTestWindow,

    #[error("Target column '{target}' not present; available: {available}")]
    UnknownTarget { target: String, available: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Persistence failures for snapshots, tables, models and reports
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} file not found at {}. Expected file with strict columns: {expected}", .path.display())]
    NotFound {
        kind: &'static str,
        path: PathBuf,
        expected: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Parquet error on {}: {reason}", .path.display())]
    Parquet { path: PathBuf, reason: String },

    #[error("JSON error on {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parquet(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        StoreError::Parquet {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures from the regression toolkit
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{model}: model has not been fitted")]
    NotFitted { model: String },

    #[error("{model}: shape mismatch, {rows} feature rows vs {targets} targets")]
    ShapeMismatch {
        model: String,
        rows: usize,
        targets: usize,
    },

    #[error("{model}: feature row {row} has {found} columns, expected {expected}")]
    RaggedRows {
        model: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{model}: {stage} failed: {reason}")]
    Toolkit {
        model: String,
        stage: &'static str,
        reason: String,
    },

    #[error("{model}: prediction contains non-finite values")]
    NonFinitePrediction { model: String },

    #[error("quantile level must be in (0, 1), got {0}")]
    InvalidQuantile(f64),
}
