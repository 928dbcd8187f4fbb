//! Feature construction and chronological splitting.

pub mod feature_builder;
pub mod time_split;

pub use feature_builder::{build_features, normalize_lags};
pub use time_split::train_test_split_time;
