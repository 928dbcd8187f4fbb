//! Adapter for the Banco de Guatemala `TipoCambio` SOAP service.

pub mod decoder;
pub mod envelope;
pub mod transport;

pub use decoder::decode_rows;
pub use envelope::build_envelope;
pub use transport::ReqwestSoapTransport;
