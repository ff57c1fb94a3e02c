//! Market snapshot model and anomaly detectors.
//!
//! Everything in this crate is synchronous and free of I/O. The stateful
//! engine that owns rolling histories lives in the `monitor` crate; this crate
//! only supplies the value types, the per-metric pulses, and the two
//! detection passes built on them:
//!
//! - [`cross_section::detect_batch`] compares instruments within one batch.
//! - [`series::evaluate`] compares an instrument against its own history.

pub mod config;
pub mod cross_section;
pub mod pulse;
pub mod report;
pub mod rolling_history;
pub mod series;
pub mod stats;
pub mod types;

pub use config::{ConfigError, DetectionConfig};
pub use report::{AlertTally, AnomalyReport, FlaggedInstrument};
pub use rolling_history::{HistoryError, RollingHistory};
pub use types::{AlertRecord, AnomalyType, Severity, Snapshot};
