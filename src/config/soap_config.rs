//! SOAP acquisition configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://banguat.gob.gt/variables/ws/TipoCambio.asmx";
pub const DEFAULT_SOAP_ACTION: &str = "http://www.banguat.gob.gt/variables/ws/TipoCambioRango";
pub const DEFAULT_NAMESPACE: &str = "http://www.banguat.gob.gt/variables/ws/";
pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const DEFAULT_START_DATE: &str = "1900-01-01";

/// Element and namespace names of the remote service.
///
/// These match the live service; fixtures with other wrappers only need the
/// row/date/rate names to line up.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapSchema {
    pub source_name: String,
    pub soap_action: String,
    /// Namespace of the request operation and the response rows. Empty matches any.
    pub namespace: String,
    pub request_element: String,
    pub row_element: String,
    pub date_element: String,
    pub rate_element: String,
}

impl Default for SoapSchema {
    fn default() -> Self {
        Self {
            source_name: "Banco de Guatemala (Banguat) TipoCambio SOAP".to_string(),
            soap_action: DEFAULT_SOAP_ACTION.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            request_element: "TipoCambioRango".to_string(),
            row_element: "Var".to_string(),
            date_element: "fecha".to_string(),
            rate_element: "venta".to_string(),
        }
    }
}

/// SOAP transport environment configuration
#[derive(Debug, Clone)]
pub struct SoapEnvConfig {
    pub endpoint: String,
    pub schema: SoapSchema,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub start_date: String,
    pub end_date: String,
}

impl SoapEnvConfig {
    pub fn from_env() -> Result<Self> {
        let endpoint =
            env::var("BANGUAT_SOAP_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        url::Url::parse(&endpoint)
            .with_context(|| format!("Invalid BANGUAT_SOAP_ENDPOINT: {}", endpoint))?;

        let defaults = SoapSchema::default();
        let schema = SoapSchema {
            source_name: defaults.source_name,
            soap_action: env::var("SOAP_ACTION").unwrap_or(defaults.soap_action),
            namespace: env::var("SOAP_NAMESPACE").unwrap_or(defaults.namespace),
            request_element: env::var("SOAP_REQUEST_ELEMENT").unwrap_or(defaults.request_element),
            row_element: env::var("SOAP_ROW_ELEMENT").unwrap_or(defaults.row_element),
            date_element: env::var("SOAP_DATE_ELEMENT").unwrap_or(defaults.date_element),
            rate_element: env::var("SOAP_RATE_ELEMENT").unwrap_or(defaults.rate_element),
        };

        let timeout_secs = env::var("SOAP_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("Failed to parse SOAP_TIMEOUT_SECONDS")?;

        let max_attempts = env::var("SOAP_MAX_RETRIES")
            .unwrap_or_else(|_| "4".to_string())
            .parse::<u32>()
            .context("Failed to parse SOAP_MAX_RETRIES")?;
        if max_attempts == 0 {
            anyhow::bail!("SOAP_MAX_RETRIES must be at least 1");
        }

        let backoff_base = parse_backoff_seconds("SOAP_BACKOFF_BASE_SECONDS", "1.0")?;
        let backoff_max = parse_backoff_seconds("SOAP_BACKOFF_MAX_SECONDS", "8.0")?;
        if backoff_max < backoff_base {
            anyhow::bail!(
                "Invalid backoff: base={:?} max={:?} (need base <= max)",
                backoff_base,
                backoff_max
            );
        }

        let start_date =
            env::var("DOWNLOAD_START_DATE").unwrap_or_else(|_| DEFAULT_START_DATE.to_string());
        let end_date = env::var("DOWNLOAD_END_DATE")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string());

        Ok(Self {
            endpoint,
            schema,
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
            backoff_base,
            backoff_max,
            start_date,
            end_date,
        })
    }
}

/// Reads a non-negative, finite number of seconds.
fn parse_backoff_seconds(key: &str, default: &str) -> Result<Duration> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    let secs = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Failed to parse {}", key))?;
    if !secs.is_finite() || secs < 0.0 {
        anyhow::bail!("{} must be a finite number >= 0, got {}", key, raw);
    }
    Duration::try_from_secs_f64(secs).with_context(|| format!("{} out of range: {}", key, raw))
}
