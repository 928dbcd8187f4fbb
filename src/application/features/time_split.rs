use crate::domain::errors::SizingError;
use crate::domain::features::{FeatureMatrix, FeatureTable, TimeSplit};

/// Splits chronologically at `len - test_days`.
///
/// Rows before the split index train, the last `test_days` rows test. The
/// target column is removed from both feature matrices.
pub fn train_test_split_time(
    table: &FeatureTable,
    test_days: usize,
    target_col: &str,
) -> Result<TimeSplit, SizingError> {
    if test_days == 0 {
        return Err(SizingError::EmptyTestWindow);
    }

    let numeric = table.numeric_columns();
    let target_idx = numeric
        .iter()
        .position(|c| c == target_col)
        .ok_or_else(|| SizingError::UnknownTarget {
            target: target_col.to_string(),
            available: numeric.join(", "),
        })?;

    if table.len() <= test_days {
        return Err(SizingError::InsufficientRows {
            rows: table.len(),
            test_days,
        });
    }
    let split_idx = table.len() - test_days;

    let columns: Vec<String> = numeric
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_idx)
        .map(|(_, c)| c.clone())
        .collect();

    let mut x_train = FeatureMatrix {
        columns: columns.clone(),
        ..FeatureMatrix::default()
    };
    let mut x_test = FeatureMatrix {
        columns,
        ..FeatureMatrix::default()
    };
    let mut y_train = Vec::with_capacity(split_idx);
    let mut y_test = Vec::with_capacity(test_days);

    for (idx, row) in table.rows().iter().enumerate() {
        let mut values = row.numeric_values();
        let target = values.remove(target_idx);
        let (x, y) = if idx < split_idx {
            (&mut x_train, &mut y_train)
        } else {
            (&mut x_test, &mut y_test)
        };
        x.dates.push(row.date);
        x.values.push(values);
        y.push(target);
    }

    Ok(TimeSplit {
        x_train,
        x_test,
        y_train,
        y_test,
    })
}
