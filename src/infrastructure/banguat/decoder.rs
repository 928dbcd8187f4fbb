//! SOAP response decoding.
//!
//! Faults are checked before rows; every row must carry both a date and a
//! rate field. Rows come back in document order.

use crate::application::acquisition::DateRange;
use crate::config::{SOAP_ENVELOPE_NAMESPACE, SoapSchema};
use crate::domain::errors::ProtocolError;
use crate::domain::fx::{RateObservation, WIRE_DATE_FORMAT};
use chrono::NaiveDate;
use roxmltree::{Document, Node};

const SOAP12_ENVELOPE_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";
const UNKNOWN_FAULT: &str = "Unknown SOAP fault.";

pub fn decode_rows(
    payload: &[u8],
    schema: &SoapSchema,
    endpoint: &str,
    range: &DateRange,
) -> Result<Vec<RateObservation>, ProtocolError> {
    let start = range.start.to_string();
    let end = range.end.to_string();

    let text = std::str::from_utf8(payload).map_err(|e| ProtocolError::InvalidXml {
        endpoint: endpoint.to_string(),
        start: start.clone(),
        end: end.clone(),
        reason: e.to_string(),
    })?;
    let doc = Document::parse(text).map_err(|e| ProtocolError::InvalidXml {
        endpoint: endpoint.to_string(),
        start: start.clone(),
        end: end.clone(),
        reason: e.to_string(),
    })?;

    if let Some(fault) = doc.descendants().find(is_fault) {
        return Err(ProtocolError::Fault {
            endpoint: endpoint.to_string(),
            start,
            end,
            message: fault_message(fault),
        });
    }

    let mut rows = Vec::new();
    for (idx, node) in doc
        .descendants()
        .filter(|n| matches_element(n, &schema.namespace, &schema.row_element))
        .enumerate()
    {
        let raw_date = child_text(node, &schema.namespace, &schema.date_element);
        let raw_rate = child_text(node, &schema.namespace, &schema.rate_element);
        let (Some(raw_date), Some(raw_rate)) = (raw_date, raw_rate) else {
            return Err(ProtocolError::MissingField {
                row: idx,
                date_field: schema.date_element.clone(),
                rate_field: schema.rate_element.clone(),
                start,
                end,
            });
        };

        let date = NaiveDate::parse_from_str(raw_date.trim(), WIRE_DATE_FORMAT).map_err(|_| {
            ProtocolError::InvalidDate {
                row: idx,
                value: raw_date.to_string(),
                start: start.clone(),
                end: end.clone(),
            }
        })?;

        let rate = raw_rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite())
            .ok_or_else(|| ProtocolError::InvalidRate {
                row: idx,
                value: raw_rate.to_string(),
                start: start.clone(),
                end: end.clone(),
            })?;

        rows.push(RateObservation::new(date, rate));
    }

    Ok(rows)
}

fn is_fault(node: &Node) -> bool {
    node.is_element()
        && node.tag_name().name() == "Fault"
        && matches!(
            node.tag_name().namespace(),
            Some(SOAP_ENVELOPE_NAMESPACE) | Some(SOAP12_ENVELOPE_NAMESPACE)
        )
}

fn fault_message(fault: Node) -> String {
    // SOAP 1.1 uses <faultstring>, SOAP 1.2 uses <Reason><Text>
    fault
        .children()
        .find(|c| c.is_element() && c.tag_name().name() == "faultstring")
        .or_else(|| {
            fault
                .descendants()
                .find(|c| c.is_element() && c.tag_name().name() == "Text")
        })
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_FAULT)
        .to_string()
}

fn matches_element(node: &Node, namespace: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && (namespace.is_empty() || node.tag_name().namespace() == Some(namespace))
}

/// Text of the first matching child. An empty element yields `Some("")`.
fn child_text<'a, 'input>(node: Node<'a, 'input>, namespace: &str, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| matches_element(c, namespace, name))
        .map(|c| c.text().unwrap_or(""))
}
