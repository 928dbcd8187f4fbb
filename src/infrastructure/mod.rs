pub mod banguat;
pub mod core;
pub mod observability;
pub mod persistence;
