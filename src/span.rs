use serde::Serialize;
use std::time::SystemTime;

use crate::types::{Attributes, SpanStatus};
use crate::utils::{next_span_id, next_trace_id, now, serialize_millis};

/// The identity of a span: the trace it belongs to and its own id.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SpanContext {
    /// Identifier shared by all spans within a single trace.
    #[serde(rename = "trace.id")]
    pub trace_id: String,
    /// Identifier of this span.
    #[serde(rename = "span.id")]
    pub span_id: String,
}

/// A span bracketing one pipeline operation.
///
/// Spans are created by the `start_*_op` reporter methods and handed to the
/// [`SpanSink`] once the matching `end_*_op` closes them.
///
/// [`SpanSink`]: crate::sink::SpanSink
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Span {
    /// Operation name, e.g. `receiver/otlp/TraceDataReceived`.
    pub name: String,
    /// Trace and span ids of this span.
    #[serde(flatten)]
    pub context: SpanContext,
    /// Id of the parent span, if this span was started under one.
    #[serde(rename = "parent.id", skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    /// Span contexts this span is linked to without being parented by them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<SpanContext>,
    /// Span start time.
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: SystemTime,
    /// Outcome attributes recorded when the operation ends.
    pub attributes: Attributes,
    /// Completion status.
    pub status: SpanStatus,
}

impl Span {
    fn new(name: String, trace_id: String) -> Span {
        Span {
            name,
            context: SpanContext {
                trace_id,
                span_id: next_span_id(),
            },
            parent_span_id: None,
            links: Vec::new(),
            timestamp: now(),
            attributes: Attributes::default(),
            status: SpanStatus::Unset,
        }
    }

    /// Start a root span in a fresh trace.
    pub fn root(name: String) -> Span {
        Span::new(name, next_trace_id())
    }

    /// Start a span in `parent`'s trace, parented by `parent`'s span.
    pub fn child_of(parent: &SpanContext, name: String) -> Span {
        let mut span = Span::new(name, parent.trace_id.clone());
        span.parent_span_id = Some(parent.span_id.clone());
        span
    }

    /// Link this span to another span context without parenting.
    pub fn add_link(&mut self, context: SpanContext) {
        self.links.push(context);
    }

    pub(crate) fn set_status(&mut self, status: SpanStatus) {
        self.status = status;
    }

    pub(crate) fn update_duration(&mut self) {
        if let Ok(duration) = SystemTime::now().duration_since(self.timestamp) {
            self.attributes
                .insert("duration.ms", duration.as_millis() as u64);
        }
    }
}

/// The context an operation runs under.
///
/// A context is either empty ([`background`]), carries the span context of a
/// remote or long-lived span ([`with_remote`]), or owns the live span of an
/// in-flight operation (returned by the `start_*_op` methods). Each in-flight
/// operation owns its context; contexts are never shared between operations.
///
/// [`background`]: OpContext::background
/// [`with_remote`]: OpContext::with_remote
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    span: Option<Span>,
    remote: Option<SpanContext>,
}

impl OpContext {
    /// An empty context with no span.
    pub fn background() -> OpContext {
        OpContext::default()
    }

    /// A context carrying the span context of a span owned elsewhere,
    /// typically the long-lived span of a stream or connection.
    pub fn with_remote(context: SpanContext) -> OpContext {
        OpContext {
            span: None,
            remote: Some(context),
        }
    }

    pub(crate) fn with_span(span: Span) -> OpContext {
        OpContext {
            span: Some(span),
            remote: None,
        }
    }

    /// The live span of this context, if any.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// The span context visible to operations started under this context.
    pub fn span_context(&self) -> Option<&SpanContext> {
        self.span
            .as_ref()
            .map(|span| &span.context)
            .or_else(|| self.remote.as_ref())
    }

    pub(crate) fn take_span(self) -> Option<Span> {
        self.span
    }
}

/// Start `name` as a child of `cx`'s span, or as a root span if `cx` carries
/// no span at all.
pub(crate) fn start_span(cx: &OpContext, name: String) -> OpContext {
    let span = match cx.span_context() {
        Some(parent) => Span::child_of(parent, name),
        None => Span::root(name),
    };
    OpContext::with_span(span)
}

/// Start `name` as a root span linked to `cx`'s span instead of parented by
/// it. Used when `cx` outlives any single operation.
pub(crate) fn start_root_span_with_link(cx: &OpContext, name: String) -> OpContext {
    let mut span = Span::root(name);
    if let Some(linked) = cx.span_context() {
        span.add_link(linked.clone());
    }
    OpContext::with_span(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_span_inherits_trace() {
        let root = Span::root("receiver/otlp/TraceDataReceived".into());
        let child = Span::child_of(&root.context, "exporter/otlp/traces".into());

        assert_eq!(child.context.trace_id, root.context.trace_id);
        assert_eq!(child.parent_span_id.as_deref(), Some(&*root.context.span_id));
        assert_ne!(child.context.span_id, root.context.span_id);
    }

    #[test]
    fn start_span_on_background_is_root() {
        let cx = start_span(&OpContext::background(), "scraper/a/b/MetricsScraped".into());
        let span = cx.span().unwrap();

        assert!(span.parent_span_id.is_none());
        assert!(span.links.is_empty());
    }

    #[test]
    fn linked_root_has_no_parent() {
        let long_lived = OpContext::with_remote(SpanContext {
            trace_id: "t".into(),
            span_id: "s".into(),
        });

        let cx = start_root_span_with_link(&long_lived, "receiver/x/LogsReceived".into());
        let span = cx.span().unwrap();

        assert!(span.parent_span_id.is_none());
        assert_ne!(span.context.trace_id, "t");
        assert_eq!(
            span.links,
            vec![SpanContext {
                trace_id: "t".into(),
                span_id: "s".into(),
            }]
        );
    }
}
