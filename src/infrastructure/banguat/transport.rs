use crate::domain::errors::TransportFailure;
use crate::domain::ports::SoapTransport;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Single-attempt SOAP POST over reqwest
pub struct ReqwestSoapTransport {
    client: Client,
    endpoint: String,
    soap_action: String,
    timeout: Duration,
}

impl ReqwestSoapTransport {
    pub fn new(endpoint: impl Into<String>, soap_action: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout),
            endpoint: endpoint.into(),
            soap_action: soap_action.into(),
            timeout,
        }
    }

    fn map_error(&self, e: reqwest::Error) -> TransportFailure {
        if e.is_timeout() {
            TransportFailure::Timeout(self.timeout)
        } else {
            TransportFailure::Network(e.to_string())
        }
    }
}

#[async_trait]
impl SoapTransport for ReqwestSoapTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, envelope: &str) -> Result<Vec<u8>, TransportFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", self.soap_action))
            .timeout(self.timeout)
            .body(envelope.to_string())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        debug!(
            "SOAP POST {} -> {} ({} bytes)",
            self.endpoint,
            status,
            body.len()
        );

        classify_response(status, &body)
    }
}

/// Keeps 2xx bodies and 500 bodies carrying a SOAP fault.
///
/// ASMX services answer faults with 500; the decoder surfaces their text
/// instead of the retry loop treating them as transport errors.
fn classify_response(status: StatusCode, body: &[u8]) -> Result<Vec<u8>, TransportFailure> {
    if status.is_success() || (status == StatusCode::INTERNAL_SERVER_ERROR && contains_fault(body)) {
        return Ok(body.to_vec());
    }
    Err(TransportFailure::Status {
        status: status.as_u16(),
    })
}

fn contains_fault(body: &[u8]) -> bool {
    std::str::from_utf8(body).is_ok_and(|text| text.contains(":Fault") || text.contains("<Fault"))
}
