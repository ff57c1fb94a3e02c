//! Snapshot sources.
//!
//! A producer hands out one batch per call and keeps no engine state. The
//! driver and the cross-sectional endpoint both go through
//! [`SnapshotProducer`], so the live feed and the static fixture are
//! interchangeable.

pub mod bvmt;
pub mod fallback;
pub mod fixture;

pub use bvmt::BvmtClient;
pub use fallback::FallbackProducer;
pub use fixture::FixtureProducer;

use std::collections::HashSet;

use async_trait::async_trait;
use market::Snapshot;

use crate::error::ProducerError;

#[async_trait]
pub trait SnapshotProducer: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Snapshot>, ProducerError>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}

/// Rejects batches the engine must not see: empty, or with a blank or
/// duplicated identifier, or with a non-finite price field.
pub fn validate_batch(batch: &[Snapshot]) -> Result<(), ProducerError> {
    if batch.is_empty() {
        return Err(ProducerError::Empty);
    }

    let mut seen = HashSet::with_capacity(batch.len());
    for s in batch {
        if s.identifier.trim().is_empty() {
            return Err(ProducerError::Malformed("blank identifier".into()));
        }
        if !seen.insert(s.identifier.as_str()) {
            return Err(ProducerError::Malformed(format!(
                "duplicate identifier {}",
                s.identifier
            )));
        }
        if !s.is_finite() {
            return Err(ProducerError::Malformed(format!(
                "non-finite value for {}",
                s.identifier
            )));
        }
    }

    Ok(())
}
