//! Destinations for finished spans and tagged measurements.
//!
//! Reporters never talk to a backend directly. Spans go through a
//! [`SpanSink`] and counters through a [`CounterSink`]; both are shared
//! across reporters and must tolerate concurrent use. Three implementations
//! ship with the crate:
//!
//! 1. [`NoopSink`]: discards everything.
//!
//! 2. [`MemorySink`]: aggregates in memory, for tests and local inspection.
//!
//! 3. [`BlockingSink`]: exports in a background thread using [`Api`].
//!
//! [`Api`]: crate::Api

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::error::Error;
use crate::span::Span;
use crate::utils::serialize_millis;

/// Receives every finished span.
///
/// Assumed infallible: a sink that cannot deliver drops the span and, at
/// most, logs about it.
pub trait SpanSink: Send + Sync {
    /// Deliver one finished span.
    fn report(&self, span: Span);
}

/// Records named measurements against a fixed set of identity tags.
pub trait CounterSink: Send + Sync {
    /// Record all `measurements` with `tags` attached, atomically with
    /// respect to other calls as far as aggregation is concerned.
    fn record(
        &self,
        tags: &[(&'static str, &str)],
        measurements: &[(&'static str, i64)],
    ) -> Result<(), Error>;
}

/// One exported measurement: a named value with identity tags.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Sample {
    /// Metric name, e.g. `receiver/accepted_spans`.
    pub name: String,
    /// Measured value.
    pub value: i64,
    /// Time the measurement was recorded.
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: SystemTime,
    /// Identity tags, e.g. `{receiver, transport}`.
    pub tags: BTreeMap<String, String>,
}

impl Sample {
    pub(crate) fn collect(
        tags: &[(&'static str, &str)],
        measurements: &[(&'static str, i64)],
    ) -> Vec<Sample> {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(key, val)| ((*key).to_string(), (*val).to_string()))
            .collect();

        measurements
            .iter()
            .map(|(name, value)| Sample {
                name: (*name).to_string(),
                value: *value,
                timestamp: crate::utils::now(),
                tags: tags.clone(),
            })
            .collect()
    }
}

mod blocking;
mod memory;
mod noop;

pub use blocking::BlockingSink;
pub use memory::MemorySink;
pub use noop::NoopSink;
