use crate::domain::errors::AcquisitionError;
use crate::domain::fx::parse_iso_date;
use chrono::{Datelike, Days, NaiveDate};

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parses and validates `YYYY-MM-DD` bounds with `start <= end`.
    pub fn parse(start: &str, end: &str) -> Result<Self, AcquisitionError> {
        let start_date = parse_iso_date(start).ok_or_else(|| AcquisitionError::InvalidDate {
            field: "start_date",
            value: start.to_string(),
        })?;
        let end_date = parse_iso_date(end).ok_or_else(|| AcquisitionError::InvalidDate {
            field: "end_date",
            value: end.to_string(),
        })?;
        Self::new(start_date, end_date)
    }

    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AcquisitionError> {
        if start > end {
            return Err(AcquisitionError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Splits the range into calendar-year chunks.
    ///
    /// Chunks are contiguous, non-overlapping and cover `[start, end]` exactly.
    pub fn yearly_chunks(&self) -> Vec<DateRange> {
        let mut chunks = Vec::new();
        let mut cursor = self.start;

        loop {
            let year_end = NaiveDate::from_ymd_opt(cursor.year(), 12, 31).unwrap_or(self.end);
            let chunk_end = year_end.min(self.end);
            chunks.push(DateRange {
                start: cursor,
                end: chunk_end,
            });

            match chunk_end.checked_add_days(Days::new(1)) {
                Some(next) if next <= self.end => cursor = next,
                _ => break,
            }
        }

        chunks
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assert_partition(range: DateRange) {
        let chunks = range.yearly_chunks();
        assert_eq!(chunks.first().unwrap().start, range.start);
        assert_eq!(chunks.last().unwrap().end, range.end);
        for chunk in &chunks {
            assert!(chunk.start <= chunk.end);
            assert_eq!(chunk.start.year(), chunk.end.year());
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].end.succ_opt().unwrap(), pair[1].start);
            assert_eq!(pair[0].end, d(pair[0].end.year(), 12, 31));
        }
    }

    #[test]
    fn test_single_day_single_chunk() {
        let range = DateRange::parse("2026-01-05", "2026-01-05").unwrap();
        assert_eq!(range.yearly_chunks(), vec![range]);
    }

    #[test]
    fn test_year_boundary_splits_into_two() {
        let range = DateRange::parse("2025-12-31", "2026-01-02").unwrap();
        let chunks = range.yearly_chunks();
        assert_eq!(
            chunks,
            vec![
                DateRange {
                    start: d(2025, 12, 31),
                    end: d(2025, 12, 31)
                },
                DateRange {
                    start: d(2026, 1, 1),
                    end: d(2026, 1, 2)
                },
            ]
        );
    }

    #[test]
    fn test_partitions_cover_range_exactly() {
        let cases = [
            ("1900-01-01", "2026-02-22"),
            ("2023-06-15", "2023-06-15"),
            ("2023-01-01", "2023-12-31"),
            ("2020-02-29", "2024-02-29"),
            ("2019-12-31", "2020-01-01"),
        ];
        for (start, end) in cases {
            assert_partition(DateRange::parse(start, end).unwrap());
        }
        assert_eq!(
            DateRange::parse("1900-01-01", "2026-02-22")
                .unwrap()
                .yearly_chunks()
                .len(),
            127
        );
    }

    #[test]
    fn test_rejects_bad_bounds() {
        assert!(matches!(
            DateRange::parse("2026-01-02", "2026-01-01"),
            Err(AcquisitionError::InvertedRange { .. })
        ));
        assert!(matches!(
            DateRange::parse("01/01/2026", "2026-01-01"),
            Err(AcquisitionError::InvalidDate {
                field: "start_date",
                ..
            })
        ));
        assert!(matches!(
            DateRange::parse("2026-01-01", "2026-13-01"),
            Err(AcquisitionError::InvalidDate {
                field: "end_date",
                ..
            })
        ));
    }
}
