use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::api::Api;
use crate::sink::{BlockingSink, CounterSink, NoopSink, SpanSink};

/// How much telemetry a reporter emits about its own pipeline.
///
/// Captured once at reporter construction. [`None`] disables all counter
/// emission for that reporter; spans are produced regardless of the level.
///
/// [`None`]: VerbosityLevel::None
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum VerbosityLevel {
    /// No counters at all.
    None,
    /// Essential counters only.
    Basic,
    /// Standard counters.
    Normal,
    /// Everything, including high-cardinality detail.
    Detailed,
}

impl Default for VerbosityLevel {
    fn default() -> Self {
        VerbosityLevel::Basic
    }
}

impl FromStr for VerbosityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(VerbosityLevel::None),
            "basic" => Ok(VerbosityLevel::Basic),
            "normal" => Ok(VerbosityLevel::Normal),
            "detailed" => Ok(VerbosityLevel::Detailed),
            other => Err(format!("unknown verbosity level: {}", other)),
        }
    }
}

/// The telemetry wiring reporters are constructed from: a verbosity level
/// and the two shared sinks.
///
/// Cloning is cheap; the sinks are shared and must tolerate concurrent use.
#[derive(Clone)]
pub struct TelemetrySettings {
    /// Counter emission gate, compared against [`VerbosityLevel::None`] only.
    pub level: VerbosityLevel,
    /// Destination for finished spans.
    pub spans: Arc<dyn SpanSink>,
    /// Destination for tagged measurements.
    pub counters: Arc<dyn CounterSink>,
}

impl TelemetrySettings {
    /// Bundle a level with explicit sinks.
    pub fn new(
        level: VerbosityLevel,
        spans: Arc<dyn SpanSink>,
        counters: Arc<dyn CounterSink>,
    ) -> TelemetrySettings {
        TelemetrySettings {
            level,
            spans,
            counters,
        }
    }

    /// Settings that discard everything, at the given level.
    pub fn noop(level: VerbosityLevel) -> TelemetrySettings {
        let sink = Arc::new(NoopSink);
        TelemetrySettings {
            level,
            spans: sink.clone(),
            counters: sink,
        }
    }
}

/// The `telemetry` section of a pipeline configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct TelemetryConfig {
    /// Verbosity level for all reporters, `basic` if absent.
    #[serde(default)]
    pub level: VerbosityLevel,
    /// Base URL of the telemetry ingest endpoint. Without one, telemetry
    /// is produced but discarded.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Api key sent with every export request.
    #[serde(default)]
    pub api_key: String,
}

impl TelemetryConfig {
    /// Build reporter settings from this configuration.
    ///
    /// With an endpoint configured, spans and measurements flow through a
    /// [`BlockingSink`] exporting to it in the background.
    pub fn settings(&self) -> TelemetrySettings {
        match &self.endpoint {
            Some(endpoint) => {
                let sink = Arc::new(BlockingSink::new(Api::new(
                    endpoint.clone(),
                    self.api_key.clone(),
                )));
                TelemetrySettings {
                    level: self.level,
                    spans: sink.clone(),
                    counters: sink,
                }
            }
            None => TelemetrySettings::noop(self.level),
        }
    }
}
