//! Chunked, retrying acquisition of the rate history.

pub mod downloader;
pub mod range_partitioner;
pub mod retry;

pub use downloader::RateDownloader;
pub use range_partitioner::DateRange;
pub use retry::{RetryExhausted, RetryPolicy, retry_with_backoff};
