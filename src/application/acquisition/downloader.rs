use super::range_partitioner::DateRange;
use super::retry::{RetryPolicy, retry_with_backoff};
use crate::config::{SoapEnvConfig, SoapSchema};
use crate::domain::errors::AcquisitionError;
use crate::domain::fx::{ISO_DATE_FORMAT, RateObservation, RateSeries, RateSnapshot};
use crate::domain::ports::SoapTransport;
use crate::infrastructure::banguat::{build_envelope, decode_rows};
use crate::infrastructure::observability::PipelineMetrics;
use std::time::Instant;
use tracing::{debug, info};

/// Drives chunking, transport, retries and decoding for one requested range.
///
/// Chunks run one after another. The first chunk that fails aborts the whole
/// download; there is no partial result.
pub struct RateDownloader<T: SoapTransport> {
    transport: T,
    schema: SoapSchema,
    retry: RetryPolicy,
    metrics: Option<PipelineMetrics>,
}

impl<T: SoapTransport> RateDownloader<T> {
    pub fn new(transport: T, schema: SoapSchema, retry: RetryPolicy) -> Self {
        Self {
            transport,
            schema,
            retry,
            metrics: None,
        }
    }

    pub fn from_config(transport: T, config: &SoapEnvConfig) -> Self {
        Self::new(
            transport,
            config.schema.clone(),
            RetryPolicy::new(config.max_attempts, config.backoff_base, config.backoff_max),
        )
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn schema(&self) -> &SoapSchema {
        &self.schema
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Downloads `[start, end]` (ISO dates) and returns the normalized series.
    pub async fn download(&self, start: &str, end: &str) -> Result<RateSnapshot, AcquisitionError> {
        let range = DateRange::parse(start, end)?;
        let chunks = range.yearly_chunks();
        info!(
            "Downloading {} from {} in {} chunk(s)",
            range,
            self.endpoint(),
            chunks.len()
        );

        let mut rows: Vec<RateObservation> = Vec::new();
        for chunk in &chunks {
            let decoded = self.fetch_chunk(chunk).await?;
            debug!("Chunk {}: {} row(s)", chunk, decoded.len());
            if let Some(metrics) = &self.metrics {
                metrics.rows_decoded_total.inc_by(decoded.len() as u64);
            }
            rows.extend(decoded);
        }

        if rows.is_empty() {
            return Err(AcquisitionError::EmptyResult {
                endpoint: self.endpoint().to_string(),
                start: range.start.to_string(),
                end: range.end.to_string(),
            });
        }

        let series = RateSeries::normalized(rows);
        info!(
            "Downloaded {} unique date(s) between {:?} and {:?}",
            series.len(),
            series.min_date(),
            series.max_date()
        );

        Ok(RateSnapshot {
            series,
            requested_start: range.start.format(ISO_DATE_FORMAT).to_string(),
            requested_end: range.end.format(ISO_DATE_FORMAT).to_string(),
        })
    }

    /// One chunk: retried POST, then a single decode. Decode errors are final.
    async fn fetch_chunk(&self, chunk: &DateRange) -> Result<Vec<RateObservation>, AcquisitionError> {
        let envelope = build_envelope(&self.schema, chunk);
        let envelope = envelope.as_str();
        let transport = &self.transport;
        let metrics = self.metrics.as_ref();
        let label = format!("SOAP {}", chunk);

        let payload = retry_with_backoff(&self.retry, &label, |attempt| async move {
            if let Some(metrics) = metrics.filter(|_| attempt > 1) {
                metrics.soap_retries_total.inc();
            }
            let started = Instant::now();
            let result = transport.post(envelope).await;
            if let Some(metrics) = metrics {
                let outcome = if result.is_ok() { "ok" } else { "transport_error" };
                metrics.observe_request(outcome, started.elapsed().as_secs_f64());
            }
            result
        })
        .await
        .map_err(|exhausted| AcquisitionError::TransportExhausted {
            endpoint: self.endpoint().to_string(),
            start: chunk.start.to_string(),
            end: chunk.end.to_string(),
            attempts: exhausted.attempts,
            last_error: exhausted.last_error.to_string(),
        })?;

        decode_rows(&payload, &self.schema, self.endpoint(), chunk).map_err(|e| {
            if let Some(metrics) = &self.metrics {
                metrics.soap_requests_total.with_label_values(&["protocol_error"]).inc();
            }
            AcquisitionError::from(e)
        })
    }
}
