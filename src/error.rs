use thiserror::Error;

/// Errors surfaced by reporter end/report calls.
///
/// Only counter-sink failures are modeled; the span sink is assumed
/// infallible at this layer.
#[derive(Error, Debug)]
pub enum Error {
    /// The export channel was shut down before the measurement was sent.
    #[error("telemetry exporter shut down")]
    Closed,

    /// A counter sink rejected the measurement.
    #[error("counter sink: {0}")]
    Sink(String),
}
