pub mod errors;
pub mod features;
pub mod fx;
pub mod ports;

pub use errors::{
    AcquisitionError, ModelError, ProtocolError, SizingError, StoreError, TransportFailure,
    ValidationError,
};
pub use features::{FeatureMatrix, FeatureRow, FeatureTable, LagFeatures, TARGET_COLUMN, TimeSplit};
pub use fx::{RateObservation, RateSeries, RateSnapshot, RawFrame, SnapshotMetadata};
pub use ports::{RegressionModel, SoapTransport};
