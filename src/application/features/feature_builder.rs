use crate::application::cleaning::clean_observations;
use crate::domain::errors::ValidationError;
use crate::domain::features::{FeatureRow, FeatureTable, LagFeatures};
use crate::domain::fx::RateObservation;
use chrono::{Datelike, Weekday};
use statrs::statistics::Statistics;
use tracing::debug;

/// Deduplicates and sorts a lag set; rejects empty sets and zero lags.
pub fn normalize_lags(lags: &[usize]) -> Result<Vec<usize>, ValidationError> {
    let mut normalized = lags.to_vec();
    normalized.sort_unstable();
    normalized.dedup();
    if normalized.is_empty() || normalized[0] == 0 {
        return Err(ValidationError::InvalidLags(lags.to_vec()));
    }
    Ok(normalized)
}

/// Builds the leakage-safe feature table.
///
/// Row `t` holds returns and P&L at `t`, lagged and rolling statistics over
/// observations up to `t`, and `pnl_next_day = pnl[t + 1]`. Rows where any of
/// these is undefined are dropped, so the first `max(lags) + 1` and the last
/// observation never appear.
pub fn build_features(
    observations: &[RateObservation],
    notional: f64,
    lags: &[usize],
) -> Result<FeatureTable, ValidationError> {
    if !(notional.is_finite() && notional > 0.0) {
        return Err(ValidationError::InvalidNotional(notional));
    }
    let lags = normalize_lags(lags)?;
    let series = clean_observations(observations.to_vec())?;
    let obs = series.observations();
    let n = obs.len();

    // returns[t] is undefined for t = 0
    let mut return_simple = vec![f64::NAN; n];
    let mut return_log = vec![f64::NAN; n];
    for t in 1..n {
        let ratio = obs[t].rate / obs[t - 1].rate;
        return_simple[t] = ratio - 1.0;
        return_log[t] = ratio.ln();
    }
    let pnl: Vec<f64> = return_simple.iter().map(|r| notional * r).collect();

    let max_lag = lags.last().copied().unwrap_or(1);
    let first = max_lag + 1;
    let last = n.saturating_sub(2);

    let mut rows = Vec::new();
    for t in first..=last {
        let lag_features = lags
            .iter()
            .map(|&lag| {
                let window = &return_simple[t + 1 - lag..=t];
                LagFeatures {
                    lag,
                    return_simple_lag: return_simple[t - lag],
                    return_log_lag: return_log[t - lag],
                    pnl_lag: pnl[t - lag],
                    roll_mean_return_simple: window.mean(),
                    roll_vol_return_simple: window.population_std_dev(),
                }
            })
            .collect();

        rows.push(FeatureRow {
            date: obs[t].date,
            rate: obs[t].rate,
            return_simple: return_simple[t],
            return_log: return_log[t],
            pnl: pnl[t],
            pnl_next_day: pnl[t + 1],
            is_weekend: u8::from(matches!(obs[t].date.weekday(), Weekday::Sat | Weekday::Sun)),
            lags: lag_features,
        });
    }

    debug!(
        "Built {} feature row(s) from {} observation(s), lags {:?}",
        rows.len(),
        n,
        lags
    );
    FeatureTable::try_new(lags, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(rates: &[f64]) -> Vec<RateObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        rates
            .iter()
            .enumerate()
            .map(|(i, &r)| RateObservation::new(start + Days::new(i as u64), r))
            .collect()
    }

    #[test]
    fn test_drops_boundary_rows() {
        let rates: Vec<f64> = (0..30).map(|i| 7.5 + 0.01 * (i % 7) as f64).collect();
        let table = build_features(&series(&rates), 10_000.0, &[1, 5]).unwrap();

        // first usable t = max_lag + 1 = 6, last = n - 2 = 28
        assert_eq!(table.len(), 23);
        assert_eq!(table.min_date(), NaiveDate::from_ymd_opt(2024, 1, 7));
        assert_eq!(table.max_date(), NaiveDate::from_ymd_opt(2024, 1, 29));
    }

    #[test]
    fn test_target_is_next_day_pnl() {
        let rates = [7.2, 7.21, 7.19, 7.25, 7.24, 7.3, 7.28];
        let obs = series(&rates);
        let table = build_features(&obs, 10_000.0, &[1, 2]).unwrap();

        for row in table.rows() {
            let t = obs.iter().position(|o| o.date == row.date).unwrap();
            let expected = 10_000.0 * (obs[t + 1].rate / obs[t].rate - 1.0);
            assert!((row.pnl_next_day - expected).abs() < 1e-12);
            let expected_pnl = 10_000.0 * (obs[t].rate / obs[t - 1].rate - 1.0);
            assert!((row.pnl - expected_pnl).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lag_and_rolling_values() {
        let rates = [100.0, 101.0, 99.0, 102.0, 103.0, 101.0];
        let table = build_features(&series(&rates), 1.0, &[2]).unwrap();

        // t = 3: returns r1 = 0.01, r2 = -0.0198.., r3 = 0.0303..
        let row = &table.rows()[0];
        let r1 = 101.0 / 100.0 - 1.0;
        let r2 = 99.0 / 101.0 - 1.0;
        let r3 = 102.0 / 99.0 - 1.0;
        let lag = &row.lags[0];
        assert!((lag.return_simple_lag - r1).abs() < 1e-12);
        assert!((lag.roll_mean_return_simple - (r2 + r3) / 2.0).abs() < 1e-12);
        assert!((lag.roll_vol_return_simple - ((r3 - r2) / 2.0).abs()).abs() < 1e-12);
        assert!((lag.return_log_lag - (101.0f64 / 100.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_weekend_flag() {
        let rates: Vec<f64> = (0..12).map(|i| 7.0 + 0.001 * i as f64).collect();
        let table = build_features(&series(&rates), 10_000.0, &[1]).unwrap();
        for row in table.rows() {
            let weekend = matches!(row.date.weekday(), Weekday::Sat | Weekday::Sun);
            assert_eq!(row.is_weekend == 1, weekend);
        }
        // 2024-01-06 is a Saturday
        assert!(table.rows().iter().any(|r| r.is_weekend == 1));
    }

    #[test]
    fn test_lags_are_normalized() {
        assert_eq!(normalize_lags(&[5, 1, 5]).unwrap(), vec![1, 5]);
        assert!(normalize_lags(&[]).is_err());
        assert!(normalize_lags(&[0, 3]).is_err());
    }

    #[test]
    fn test_parameter_and_size_errors() {
        let obs = series(&[7.0, 7.1, 7.2]);
        assert_eq!(
            build_features(&obs, 0.0, &[1]),
            Err(ValidationError::InvalidNotional(0.0))
        );
        assert_eq!(
            build_features(&obs, 1.0, &[5]),
            Err(ValidationError::Empty { table: "Feature" })
        );
    }
}
