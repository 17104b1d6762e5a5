use std::error::Error as StdError;
use std::sync::Arc;

use crate::config::{TelemetrySettings, VerbosityLevel};
use crate::error::Error;
use crate::outcome::{classify, Role};
use crate::sink::{CounterSink, SpanSink};
use crate::span::{start_root_span_with_link, start_span, OpContext};

const TAG_RECEIVER: &str = "receiver";
const TAG_TRANSPORT: &str = "transport";

const TRANSPORT_KEY: &str = "transport";
const FORMAT_KEY: &str = "format";

struct Signal {
    span_suffix: &'static str,
    accepted_key: &'static str,
    refused_key: &'static str,
    accepted_metric: &'static str,
    refused_metric: &'static str,
}

const TRACES: Signal = Signal {
    span_suffix: "TraceDataReceived",
    accepted_key: "accepted_spans",
    refused_key: "refused_spans",
    accepted_metric: "receiver/accepted_spans",
    refused_metric: "receiver/refused_spans",
};

const METRICS: Signal = Signal {
    span_suffix: "MetricsReceived",
    accepted_key: "accepted_metric_points",
    refused_key: "refused_metric_points",
    accepted_metric: "receiver/accepted_metric_points",
    refused_metric: "receiver/refused_metric_points",
};

const LOGS: Signal = Signal {
    span_suffix: "LogsReceived",
    accepted_key: "accepted_log_records",
    refused_key: "refused_log_records",
    accepted_metric: "receiver/accepted_log_records",
    refused_metric: "receiver/refused_log_records",
};

/// Brackets inbound-data-received operations for one receiver+transport
/// pair with a span, and counts accepted/refused items per signal kind.
///
/// Receivers only ever produce accepted and refused buckets; dropping is a
/// processor outcome.
pub struct ReceiverReporter {
    receiver_id: String,
    transport: String,
    long_lived_ctx: bool,
    level: VerbosityLevel,
    spans: Arc<dyn SpanSink>,
    counters: Arc<dyn CounterSink>,
}

impl ReceiverReporter {
    /// Create a reporter for `receiver_id` receiving over `transport`.
    pub fn new(
        receiver_id: impl Into<String>,
        transport: impl Into<String>,
        settings: &TelemetrySettings,
    ) -> ReceiverReporter {
        ReceiverReporter {
            receiver_id: receiver_id.into(),
            transport: transport.into(),
            long_lived_ctx: false,
            level: settings.level,
            spans: settings.spans.clone(),
            counters: settings.counters.clone(),
        }
    }

    /// Mark the caller-supplied context as outliving any single operation.
    ///
    /// When set, `start_*_op` starts a fresh root span with a link back to
    /// the supplied context's span instead of parenting under it. Used for
    /// stream- or connection-scoped contexts.
    pub fn with_long_lived_ctx(mut self, long_lived_ctx: bool) -> ReceiverReporter {
        self.long_lived_ctx = long_lived_ctx;
        self
    }

    /// Start a span bracketing one trace-receive operation.
    pub fn start_traces_op(&self, cx: &OpContext) -> OpContext {
        self.start_op(cx, &TRACES)
    }

    /// End the operation started by [`start_traces_op`](Self::start_traces_op).
    pub fn end_traces_op(
        &self,
        cx: OpContext,
        format: &str,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        self.end_op(cx, format, item_count, err, &TRACES)
    }

    /// Start a span bracketing one metrics-receive operation.
    pub fn start_metrics_op(&self, cx: &OpContext) -> OpContext {
        self.start_op(cx, &METRICS)
    }

    /// End the operation started by [`start_metrics_op`](Self::start_metrics_op).
    pub fn end_metrics_op(
        &self,
        cx: OpContext,
        format: &str,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        self.end_op(cx, format, item_count, err, &METRICS)
    }

    /// Start a span bracketing one logs-receive operation.
    pub fn start_logs_op(&self, cx: &OpContext) -> OpContext {
        self.start_op(cx, &LOGS)
    }

    /// End the operation started by [`start_logs_op`](Self::start_logs_op).
    pub fn end_logs_op(
        &self,
        cx: OpContext,
        format: &str,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        self.end_op(cx, format, item_count, err, &LOGS)
    }

    fn start_op(&self, cx: &OpContext, signal: &Signal) -> OpContext {
        let name = format!("receiver/{}/{}", self.receiver_id, signal.span_suffix);

        if self.long_lived_ctx {
            start_root_span_with_link(cx, name)
        } else {
            start_span(cx, name)
        }
    }

    fn end_op(
        &self,
        cx: OpContext,
        format: &str,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
        signal: &Signal,
    ) -> Result<(), Error> {
        let outcome = classify(Role::Receive, item_count, err);

        if let Some(mut span) = cx.take_span() {
            span.attributes.insert(TRANSPORT_KEY, self.transport.as_str());
            span.attributes.insert(FORMAT_KEY, format);
            span.attributes.insert(signal.accepted_key, outcome.success);
            span.attributes.insert(signal.refused_key, outcome.failure);
            span.set_status(outcome.status);
            span.update_duration();
            self.spans.report(span);
        }

        if self.level != VerbosityLevel::None {
            self.counters.record(
                &[
                    (TAG_RECEIVER, self.receiver_id.as_str()),
                    (TAG_TRANSPORT, self.transport.as_str()),
                ],
                &[
                    (signal.accepted_metric, outcome.success),
                    (signal.refused_metric, outcome.failure),
                ],
            )?;
        }

        Ok(())
    }
}
