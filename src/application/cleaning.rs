//! Re-validation of raw rate tables.

use crate::domain::errors::ValidationError;
use crate::domain::fx::{RAW_COLUMNS, RateObservation, RateSeries, RawFrame, parse_iso_date};

/// Cleans an untyped `date,rate` table into a validated series.
///
/// Rows missing either value are dropped. The remaining rows are coerced,
/// sorted and deduplicated by date (last row wins), then checked for
/// emptiness, positivity and strict ordering.
pub fn clean_frame(frame: &RawFrame) -> Result<RateSeries, ValidationError> {
    let missing: Vec<&str> = RAW_COLUMNS
        .iter()
        .copied()
        .filter(|c| frame.column_index(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns {
            missing: missing.join(", "),
        });
    }
    if frame.columns.len() != RAW_COLUMNS.len() {
        return Err(ValidationError::ColumnMismatch {
            expected: RAW_COLUMNS.join(", "),
            found: frame.columns.join(", "),
        });
    }

    let (date_idx, rate_idx) = match (frame.column_index("date"), frame.column_index("rate")) {
        (Some(d), Some(r)) => (d, r),
        _ => {
            return Err(ValidationError::MissingColumns {
                missing: RAW_COLUMNS.join(", "),
            });
        }
    };

    let mut observations = Vec::with_capacity(frame.len());
    for (row_idx, row) in frame.rows.iter().enumerate() {
        let cell = |idx: usize| {
            row.get(idx)
                .and_then(|c| c.as_deref())
                .map(str::trim)
                .filter(|c| !c.is_empty())
        };
        let (Some(raw_date), Some(raw_rate)) = (cell(date_idx), cell(rate_idx)) else {
            continue;
        };

        observations.push(coerce_observation(row_idx, raw_date, raw_rate)?);
    }

    clean_observations(observations)
}

/// Coerces one `date,rate` cell pair. `row` is only used for error context.
pub fn coerce_observation(
    row: usize,
    raw_date: &str,
    raw_rate: &str,
) -> Result<RateObservation, ValidationError> {
    let date = parse_iso_date(raw_date).ok_or_else(|| ValidationError::InvalidType {
        column: "date".to_string(),
        row,
        value: raw_date.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })?;
    let rate = raw_rate
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .ok_or_else(|| ValidationError::InvalidType {
            column: "rate".to_string(),
            row,
            value: raw_rate.to_string(),
            reason: "expected a finite number".to_string(),
        })?;

    Ok(RateObservation::new(date, rate))
}

/// Sorts, deduplicates and validates already typed observations.
pub fn clean_observations(observations: Vec<RateObservation>) -> Result<RateSeries, ValidationError> {
    let series = RateSeries::normalized(observations);
    validate_series(&series)?;
    Ok(series)
}

/// Checks the invariants every cleaned series must hold.
pub fn validate_series(series: &RateSeries) -> Result<(), ValidationError> {
    if series.is_empty() {
        return Err(ValidationError::Empty { table: "FX" });
    }

    if let Some(bad) = series.observations().iter().find(|o| o.rate <= 0.0 || !o.rate.is_finite()) {
        return Err(ValidationError::NonPositiveRate {
            date: bad.date.to_string(),
            rate: bad.rate,
        });
    }

    if let Some(pair) = series
        .observations()
        .windows(2)
        .find(|w| w[0].date >= w[1].date)
    {
        return Err(ValidationError::NotStrictlyIncreasing {
            previous: pair[0].date.to_string(),
            next: pair[1].date.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: &[&str], rows: &[[Option<&str>; 2]]) -> RawFrame {
        let mut frame = RawFrame::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            frame.push_row(row.iter().map(|c| c.map(str::to_string)).collect());
        }
        frame
    }

    #[test]
    fn test_clean_sorts_dedups_and_drops_missing() {
        let raw = frame(
            &["date", "rate"],
            &[
                [Some("2024-01-03"), Some("7.3")],
                [Some("2024-01-01"), Some("7.1")],
                [Some("2024-01-02"), None],
                [Some("2024-01-01"), Some("7.15")],
                [None, Some("7.0")],
            ],
        );

        let series = clean_frame(&raw).unwrap();
        let rates: Vec<f64> = series.observations().iter().map(|o| o.rate).collect();
        assert_eq!(rates, vec![7.15, 7.3]);
    }

    #[test]
    fn test_coerce_observation_reports_column_and_row() {
        let obs = coerce_observation(0, "2024-01-05", "7.75").unwrap();
        assert_eq!(obs.rate, 7.75);

        assert!(matches!(
            coerce_observation(3, "05/01/2024", "7.75"),
            Err(ValidationError::InvalidType { ref column, row: 3, .. }) if column == "date"
        ));
        assert!(matches!(
            coerce_observation(4, "2024-01-05", "inf"),
            Err(ValidationError::InvalidType { ref column, row: 4, .. }) if column == "rate"
        ));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let raw = frame(
            &["rate", "date"],
            &[
                [Some("7.82"), Some("2024-02-01")],
                [Some("7.8"), Some("2024-01-31")],
                [Some("7.81"), Some("2024-02-01")],
            ],
        );

        let once = clean_frame(&raw).unwrap();
        let twice = clean_frame(&once.to_frame()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_schema_errors_name_the_problem() {
        let missing = frame(&["date", "value"], &[]);
        assert_eq!(
            clean_frame(&missing),
            Err(ValidationError::MissingColumns {
                missing: "rate".to_string()
            })
        );

        let extra = frame(&["date", "rate", "source"], &[]);
        assert!(matches!(
            clean_frame(&extra),
            Err(ValidationError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn test_type_coercion_failure() {
        let raw = frame(&["date", "rate"], &[[Some("01/02/2024"), Some("7.8")]]);
        assert!(matches!(
            clean_frame(&raw),
            Err(ValidationError::InvalidType { ref column, row: 0, .. }) if column == "date"
        ));

        let raw = frame(&["date", "rate"], &[[Some("2024-02-01"), Some("seven")]]);
        assert!(matches!(
            clean_frame(&raw),
            Err(ValidationError::InvalidType { ref column, .. }) if column == "rate"
        ));
    }

    #[test]
    fn test_rejects_empty_and_non_positive() {
        let raw = frame(&["date", "rate"], &[[Some("2024-02-01"), None]]);
        assert_eq!(clean_frame(&raw), Err(ValidationError::Empty { table: "FX" }));

        let raw = frame(
            &["date", "rate"],
            &[[Some("2024-02-01"), Some("7.8")], [Some("2024-02-02"), Some("0")]],
        );
        assert!(matches!(
            clean_frame(&raw),
            Err(ValidationError::NonPositiveRate { .. })
        ));
    }
}
