use std::sync::Arc;

use crate::config::{TelemetrySettings, VerbosityLevel};
use crate::error::Error;
use crate::sink::CounterSink;

const TAG_PROCESSOR: &str = "processor";

const PROCESSOR_PREFIX: &str = "processor/";
const NAME_SEP: &str = "/";

const ACCEPTED_SPANS: &str = "processor/accepted_spans";
const REFUSED_SPANS: &str = "processor/refused_spans";
const DROPPED_SPANS: &str = "processor/dropped_spans";

const ACCEPTED_METRIC_POINTS: &str = "processor/accepted_metric_points";
const REFUSED_METRIC_POINTS: &str = "processor/refused_metric_points";
const DROPPED_METRIC_POINTS: &str = "processor/dropped_metric_points";

const ACCEPTED_LOG_RECORDS: &str = "processor/accepted_log_records";
const REFUSED_LOG_RECORDS: &str = "processor/refused_log_records";
const DROPPED_LOG_RECORDS: &str = "processor/dropped_log_records";

/// Compose a custom processor metric name following the crate's naming
/// convention. `config_type` should be the value identifying the processor
/// type in the configuration. An empty `config_type` yields just the prefix.
pub fn build_processor_custom_metric_name(config_type: &str, metric: &str) -> String {
    if config_type.is_empty() {
        return PROCESSOR_PREFIX.to_string();
    }
    format!("{}{}{}{}", PROCESSOR_PREFIX, config_type, NAME_SEP, metric)
}

/// Records accepted/refused/dropped counters for one processor.
///
/// Processors transform data already in flight, so there is no span
/// bracketing, only counters. Every call writes the full
/// accepted/refused/dropped triple for its signal kind, with explicit
/// zeros for the two buckets that did not occur, so downstream
/// aggregation never sees a sparse triple.
pub struct ProcessorReporter {
    processor_id: String,
    level: VerbosityLevel,
    counters: Arc<dyn CounterSink>,
}

impl ProcessorReporter {
    /// Create a reporter for `processor_id`.
    pub fn new(processor_id: impl Into<String>, settings: &TelemetrySettings) -> ProcessorReporter {
        ProcessorReporter {
            processor_id: processor_id.into(),
            level: settings.level,
            counters: settings.counters.clone(),
        }
    }

    /// Report that `num_spans` spans were accepted.
    pub fn traces_accepted(&self, num_spans: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_SPANS, num_spans as i64),
            (REFUSED_SPANS, 0),
            (DROPPED_SPANS, 0),
        ])
    }

    /// Report that `num_spans` spans were refused.
    pub fn traces_refused(&self, num_spans: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_SPANS, 0),
            (REFUSED_SPANS, num_spans as i64),
            (DROPPED_SPANS, 0),
        ])
    }

    /// Report that `num_spans` spans were dropped.
    pub fn traces_dropped(&self, num_spans: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_SPANS, 0),
            (REFUSED_SPANS, 0),
            (DROPPED_SPANS, num_spans as i64),
        ])
    }

    /// Report that `num_points` metric points were accepted.
    pub fn metrics_accepted(&self, num_points: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_METRIC_POINTS, num_points as i64),
            (REFUSED_METRIC_POINTS, 0),
            (DROPPED_METRIC_POINTS, 0),
        ])
    }

    /// Report that `num_points` metric points were refused.
    pub fn metrics_refused(&self, num_points: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_METRIC_POINTS, 0),
            (REFUSED_METRIC_POINTS, num_points as i64),
            (DROPPED_METRIC_POINTS, 0),
        ])
    }

    /// Report that `num_points` metric points were dropped.
    ///
    /// Sink errors on this path are tolerated silently.
    pub fn metrics_dropped(&self, num_points: usize) -> Result<(), Error> {
        let res = self.record(&[
            (ACCEPTED_METRIC_POINTS, 0),
            (REFUSED_METRIC_POINTS, 0),
            (DROPPED_METRIC_POINTS, num_points as i64),
        ]);

        if let Err(err) = res {
            log::debug!("dropped-metrics measurement not recorded: {}", err);
        }

        Ok(())
    }

    /// Report that `num_records` log records were accepted.
    pub fn logs_accepted(&self, num_records: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_LOG_RECORDS, num_records as i64),
            (REFUSED_LOG_RECORDS, 0),
            (DROPPED_LOG_RECORDS, 0),
        ])
    }

    /// Report that `num_records` log records were refused.
    pub fn logs_refused(&self, num_records: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_LOG_RECORDS, 0),
            (REFUSED_LOG_RECORDS, num_records as i64),
            (DROPPED_LOG_RECORDS, 0),
        ])
    }

    /// Report that `num_records` log records were dropped.
    pub fn logs_dropped(&self, num_records: usize) -> Result<(), Error> {
        self.record(&[
            (ACCEPTED_LOG_RECORDS, 0),
            (REFUSED_LOG_RECORDS, 0),
            (DROPPED_LOG_RECORDS, num_records as i64),
        ])
    }

    fn record(&self, measurements: &[(&'static str, i64)]) -> Result<(), Error> {
        if self.level == VerbosityLevel::None {
            return Ok(());
        }
        self.counters
            .record(&[(TAG_PROCESSOR, self.processor_id.as_str())], measurements)
    }
}
