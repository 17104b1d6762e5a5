use std::error::Error as StdError;
use std::sync::Arc;

use crate::config::{TelemetrySettings, VerbosityLevel};
use crate::error::Error;
use crate::outcome::{classify, Role};
use crate::sink::{CounterSink, SpanSink};
use crate::span::{start_span, OpContext};

const TAG_EXPORTER: &str = "exporter";

struct Signal {
    span_suffix: &'static str,
    sent_key: &'static str,
    failed_key: &'static str,
    sent_metric: &'static str,
    failed_metric: &'static str,
}

const TRACES: Signal = Signal {
    span_suffix: "traces",
    sent_key: "sent_spans",
    failed_key: "send_failed_spans",
    sent_metric: "exporter/sent_spans",
    failed_metric: "exporter/send_failed_spans",
};

const METRICS: Signal = Signal {
    span_suffix: "metrics",
    sent_key: "sent_metric_points",
    failed_key: "send_failed_metric_points",
    sent_metric: "exporter/sent_metric_points",
    failed_metric: "exporter/send_failed_metric_points",
};

const LOGS: Signal = Signal {
    span_suffix: "logs",
    sent_key: "sent_log_records",
    failed_key: "send_failed_log_records",
    sent_metric: "exporter/sent_log_records",
    failed_metric: "exporter/send_failed_log_records",
};

/// Brackets outbound send operations for one exporter with a span, and
/// counts sent/failed-to-send items per signal kind.
///
/// Export partial failures are counted as full item-count failures, unlike
/// scraping: the batch reached nobody the caller can rely on.
pub struct ExporterReporter {
    exporter_id: String,
    level: VerbosityLevel,
    spans: Arc<dyn SpanSink>,
    counters: Arc<dyn CounterSink>,
}

impl ExporterReporter {
    /// Create a reporter for `exporter_id`.
    pub fn new(exporter_id: impl Into<String>, settings: &TelemetrySettings) -> ExporterReporter {
        ExporterReporter {
            exporter_id: exporter_id.into(),
            level: settings.level,
            spans: settings.spans.clone(),
            counters: settings.counters.clone(),
        }
    }

    /// Start a span bracketing one trace-send operation.
    pub fn start_traces_op(&self, cx: &OpContext) -> OpContext {
        self.start_op(cx, &TRACES)
    }

    /// End the operation started by [`start_traces_op`](Self::start_traces_op).
    pub fn end_traces_op(
        &self,
        cx: OpContext,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        self.end_op(cx, item_count, err, &TRACES)
    }

    /// Start a span bracketing one metrics-send operation.
    pub fn start_metrics_op(&self, cx: &OpContext) -> OpContext {
        self.start_op(cx, &METRICS)
    }

    /// End the operation started by [`start_metrics_op`](Self::start_metrics_op).
    pub fn end_metrics_op(
        &self,
        cx: OpContext,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        self.end_op(cx, item_count, err, &METRICS)
    }

    /// Start a span bracketing one logs-send operation.
    pub fn start_logs_op(&self, cx: &OpContext) -> OpContext {
        self.start_op(cx, &LOGS)
    }

    /// End the operation started by [`start_logs_op`](Self::start_logs_op).
    pub fn end_logs_op(
        &self,
        cx: OpContext,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        self.end_op(cx, item_count, err, &LOGS)
    }

    fn start_op(&self, cx: &OpContext, signal: &Signal) -> OpContext {
        let name = format!("exporter/{}/{}", self.exporter_id, signal.span_suffix);
        start_span(cx, name)
    }

    fn end_op(
        &self,
        cx: OpContext,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
        signal: &Signal,
    ) -> Result<(), Error> {
        let outcome = classify(Role::Export, item_count, err);

        if let Some(mut span) = cx.take_span() {
            span.attributes.insert(signal.sent_key, outcome.success);
            span.attributes.insert(signal.failed_key, outcome.failure);
            span.set_status(outcome.status);
            span.update_duration();
            self.spans.report(span);
        }

        if self.level != VerbosityLevel::None {
            self.counters.record(
                &[(TAG_EXPORTER, self.exporter_id.as_str())],
                &[
                    (signal.sent_metric, outcome.success),
                    (signal.failed_metric, outcome.failure),
                ],
            )?;
        }

        Ok(())
    }
}
