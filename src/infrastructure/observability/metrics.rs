//! Prometheus metrics for the acquisition and feature pipeline
//!
//! All metrics use the `fxvar_` prefix. Nothing is served over HTTP; the
//! rendered text is written to the log at the end of a run.

use prometheus::{
    CounterVec, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,
    /// SOAP requests by outcome (`ok`, `transport_error`, `protocol_error`)
    pub soap_requests_total: CounterVec,
    /// Retries issued after a failed attempt
    pub soap_retries_total: IntCounter,
    /// Wall time per SOAP POST
    pub soap_request_seconds: HistogramVec,
    /// Rows decoded from SOAP responses, before normalization
    pub rows_decoded_total: IntCounter,
    /// Rows in the last feature table built
    pub feature_rows: Gauge,
}

impl PipelineMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let soap_requests_total = CounterVec::new(
            Opts::new("fxvar_soap_requests_total", "SOAP requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(soap_requests_total.clone()))?;

        let soap_retries_total = IntCounter::with_opts(Opts::new(
            "fxvar_soap_retries_total",
            "SOAP retries after a failed attempt",
        ))?;
        registry.register(Box::new(soap_retries_total.clone()))?;

        let soap_request_seconds = HistogramVec::new(
            HistogramOpts::new("fxvar_soap_request_seconds", "SOAP request latency")
                .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(soap_request_seconds.clone()))?;

        let rows_decoded_total = IntCounter::with_opts(Opts::new(
            "fxvar_rows_decoded_total",
            "Rate rows decoded from SOAP responses",
        ))?;
        registry.register(Box::new(rows_decoded_total.clone()))?;

        let feature_rows = Gauge::with_opts(Opts::new(
            "fxvar_feature_rows",
            "Rows in the most recent feature table",
        ))?;
        registry.register(Box::new(feature_rows.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            soap_requests_total,
            soap_retries_total,
            soap_request_seconds,
            rows_decoded_total,
            feature_rows,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn observe_request(&self, outcome: &str, seconds: f64) {
        self.soap_requests_total.with_label_values(&[outcome]).inc();
        self.soap_request_seconds
            .with_label_values(&[outcome])
            .observe(seconds);
    }
}
