use crate::application::acquisition::DateRange;
use crate::config::SoapSchema;
use crate::domain::fx::WIRE_DATE_FORMAT;

/// Builds the request envelope for one chunk, dates as `DD/MM/YYYY`.
pub fn build_envelope(schema: &SoapSchema, range: &DateRange) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
               xmlns:xsd="http://www.w3.org/2001/XMLSchema"
               xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <{op} xmlns="{ns}">
      <fechainit>{start}</fechainit>
      <fechafin>{end}</fechafin>
    </{op}>
  </soap:Body>
</soap:Envelope>
"#,
        op = schema.request_element,
        ns = schema.namespace,
        start = range.start.format(WIRE_DATE_FORMAT),
        end = range.end.format(WIRE_DATE_FORMAT),
    )
}
