#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use fxvar::domain::errors::TransportFailure;
use fxvar::domain::fx::RateObservation;
use fxvar::domain::ports::SoapTransport;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub const FAKE_ENDPOINT: &str = "https://fake.banguat.test/variables/ws/TipoCambio.asmx";

/// Answers each POST with the next scripted result and records the envelopes
pub struct FakeTransport {
    responses: Mutex<Vec<Result<Vec<u8>, TransportFailure>>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<Result<Vec<u8>, TransportFailure>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SoapTransport for FakeTransport {
    fn endpoint(&self) -> &str {
        FAKE_ENDPOINT
    }

    async fn post(&self, envelope: &str) -> Result<Vec<u8>, TransportFailure> {
        self.requests.lock().unwrap().push(envelope.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(TransportFailure::Network("no scripted response".into())))
    }
}

/// `TipoCambioRango` response with one `<Var>` per (DD/MM/YYYY, rate)
pub fn rates_response(rows: &[(String, f64)]) -> Vec<u8> {
    let vars: String = rows
        .iter()
        .map(|(fecha, venta)| {
            format!("<Var><moneda>2</moneda><fecha>{fecha}</fecha><venta>{venta}</venta><compra>{venta}</compra></Var>")
        })
        .collect();
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soap:Body>",
            r#"<TipoCambioRangoResponse xmlns="http://www.banguat.gob.gt/variables/ws/">"#,
            "<TipoCambioRangoResult><Vars>{}</Vars><TotalItems>{}</TotalItems></TipoCambioRangoResult>",
            "</TipoCambioRangoResponse></soap:Body></soap:Envelope>"
        ),
        vars,
        rows.len()
    )
    .into_bytes()
}

pub fn fault_response(message: &str) -> Vec<u8> {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<soap:Body><soap:Fault><faultcode>soap:Server</faultcode>",
            "<faultstring>{}</faultstring><detail /></soap:Fault></soap:Body></soap:Envelope>"
        ),
        message
    )
    .into_bytes()
}

pub fn wire_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `n` consecutive daily rates from 2024-01-01, gently oscillating around 7.2
pub fn synthetic_series(n: usize) -> Vec<RateObservation> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let t = i as f64;
            let rate = 7.2 + 0.0036 * t.sqrt() + 0.01 * (t * 0.21).sin() + 0.004 * (t * 1.7).cos();
            RateObservation::new(start + Days::new(i as u64), rate)
        })
        .collect()
}

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique scratch directory under the system temp dir, removed on drop
pub struct TestDir(PathBuf);

impl TestDir {
    pub fn new(label: &str) -> Self {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "fxvar_it_{}_{}_{}",
            std::process::id(),
            unique_id,
            label
        ));
        std::fs::create_dir_all(&dir).expect("Failed to create test temp dir");
        Self(dir)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}
