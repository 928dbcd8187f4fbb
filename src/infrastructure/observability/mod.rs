//! Pipeline observability
//!
//! Counters are collected in-process and rendered into the log when
//! `OBSERVABILITY_ENABLED` is set. There is no HTTP endpoint.

pub mod metrics;

pub use metrics::PipelineMetrics;
