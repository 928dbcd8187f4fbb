// Chunked SOAP acquisition with retries
pub mod acquisition;

// Raw table validation
pub mod cleaning;

// Feature construction and chronological split
pub mod features;

// Regression models and forecast metrics
pub mod evaluation;
pub mod ml;

// Stage orchestration
pub mod pipeline;
