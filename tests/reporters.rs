use pretty_assertions::assert_eq;
use std::io;
use std::sync::Arc;

use obsreport::{
    CounterSink, Error, ExporterReporter, MemorySink, OpContext, PartialFailure,
    ProcessorReporter, ReceiverReporter, ScraperReporter, Span, SpanContext, SpanSink, SpanStatus,
    TelemetrySettings, VerbosityLevel,
};

fn memory_settings(level: VerbosityLevel) -> (Arc<MemorySink>, TelemetrySettings) {
    let sink = Arc::new(MemorySink::new());
    let settings = TelemetrySettings::new(level, sink.clone(), sink.clone());
    (sink, settings)
}

/// A counter sink that rejects every measurement.
struct FailingSink;

impl SpanSink for FailingSink {
    fn report(&self, _span: Span) {}
}

impl CounterSink for FailingSink {
    fn record(
        &self,
        _tags: &[(&'static str, &str)],
        _measurements: &[(&'static str, i64)],
    ) -> Result<(), Error> {
        Err(Error::Sink("measurement store unavailable".into()))
    }
}

fn failing_settings() -> TelemetrySettings {
    let sink = Arc::new(FailingSink);
    TelemetrySettings::new(VerbosityLevel::Normal, sink.clone(), sink)
}

#[test]
fn receiver_end_to_end() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ReceiverReporter::new("fakeReceiver", "fakeTransport", &settings);

    let op = reporter.start_traces_op(&OpContext::background());
    let err = io::Error::new(io::ErrorKind::Other, "refused by downstream");
    reporter.end_traces_op(op, "protobuf", 13, Some(&err)).unwrap();

    let op = reporter.start_traces_op(&OpContext::background());
    reporter.end_traces_op(op, "protobuf", 42, None).unwrap();

    let spans = sink.spans();
    assert_eq!(spans.len(), 2);
    for span in &spans {
        assert_eq!(span.name, "receiver/fakeReceiver/TraceDataReceived");
    }
    assert_eq!(
        spans[0].status,
        SpanStatus::Error("refused by downstream".into())
    );
    assert_eq!(spans[1].status, SpanStatus::Unset);

    let tags = [("receiver", "fakeReceiver"), ("transport", "fakeTransport")];
    assert_eq!(sink.counter("receiver/accepted_spans", &tags), 42);
    assert_eq!(sink.counter("receiver/refused_spans", &tags), 13);
}

#[test]
fn long_lived_context_links_instead_of_parenting() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ReceiverReporter::new("streamed", "grpc", &settings).with_long_lived_ctx(true);

    let long_lived = OpContext::with_remote(SpanContext {
        trace_id: "stream-trace".into(),
        span_id: "stream-span".into(),
    });

    let op = reporter.start_logs_op(&long_lived);
    reporter.end_logs_op(op, "otlp", 3, None).unwrap();

    let spans = sink.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].parent_span_id, None);
    assert_ne!(spans[0].context.trace_id, "stream-trace");
    assert_eq!(
        spans[0].links,
        vec![SpanContext {
            trace_id: "stream-trace".into(),
            span_id: "stream-span".into(),
        }]
    );
}

#[test]
fn short_lived_context_parents_under_the_caller_span() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let receiver = ReceiverReporter::new("otlp", "grpc", &settings);
    let exporter = ExporterReporter::new("otlphttp", &settings);

    let recv_op = receiver.start_metrics_op(&OpContext::background());
    let export_op = exporter.start_metrics_op(&recv_op);
    exporter.end_metrics_op(export_op, 10, None).unwrap();
    receiver.end_metrics_op(recv_op, "otlp", 10, None).unwrap();

    let spans = sink.spans();
    assert_eq!(spans.len(), 2);
    // exporter span ended first, parented under the receiver span
    assert_eq!(spans[0].name, "exporter/otlphttp/metrics");
    assert_eq!(spans[1].name, "receiver/otlp/MetricsReceived");
    assert_eq!(
        spans[0].parent_span_id.as_ref(),
        Some(&spans[1].context.span_id)
    );
    assert_eq!(spans[0].context.trace_id, spans[1].context.trace_id);
}

#[test]
fn scraper_partial_failure_counts_endpoints() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ScraperReporter::new("hostmetrics", "disk", &settings);

    let op = reporter.start_metrics_op(&OpContext::background());
    let partial = PartialFailure::new(5, "5 mount points unreadable");
    reporter.end_metrics_op(op, 120, Some(&partial)).unwrap();

    let tags = [("receiver", "hostmetrics"), ("scraper", "disk")];
    assert_eq!(sink.counter("scraper/scraped_metric_points", &tags), 120);
    assert_eq!(sink.counter("scraper/errored_metric_points", &tags), 5);

    let spans = sink.spans();
    assert_eq!(spans[0].name, "scraper/hostmetrics/disk/MetricsScraped");
    assert_eq!(
        spans[0].status,
        SpanStatus::Error("5 mount points unreadable".into())
    );
}

#[test]
fn processor_triple_converges() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ProcessorReporter::new("fakeProcessor", &settings);

    reporter.traces_accepted(27).unwrap();
    reporter.traces_refused(19).unwrap();
    reporter.traces_dropped(13).unwrap();

    let tags = [("processor", "fakeProcessor")];
    assert_eq!(sink.counter("processor/accepted_spans", &tags), 27);
    assert_eq!(sink.counter("processor/refused_spans", &tags), 19);
    assert_eq!(sink.counter("processor/dropped_spans", &tags), 13);
    // each call wrote its full triple in a single record
    assert_eq!(sink.record_calls(), 3);
}

#[test]
fn processor_covers_all_signal_kinds() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ProcessorReporter::new("transform", &settings);

    reporter.metrics_accepted(4).unwrap();
    reporter.metrics_dropped(6).unwrap();
    reporter.logs_accepted(8).unwrap();
    reporter.logs_refused(2).unwrap();
    reporter.logs_dropped(1).unwrap();

    let tags = [("processor", "transform")];
    assert_eq!(sink.counter("processor/accepted_metric_points", &tags), 4);
    assert_eq!(sink.counter("processor/refused_metric_points", &tags), 0);
    assert_eq!(sink.counter("processor/dropped_metric_points", &tags), 6);
    assert_eq!(sink.counter("processor/accepted_log_records", &tags), 8);
    assert_eq!(sink.counter("processor/refused_log_records", &tags), 2);
    assert_eq!(sink.counter("processor/dropped_log_records", &tags), 1);
}

#[test]
fn verbosity_none_silences_counters_but_not_spans() {
    let (sink, settings) = memory_settings(VerbosityLevel::None);

    let receiver = ReceiverReporter::new("otlp", "grpc", &settings);
    let op = receiver.start_traces_op(&OpContext::background());
    let err = io::Error::new(io::ErrorKind::Other, "boom");
    receiver.end_traces_op(op, "otlp", 7, Some(&err)).unwrap();

    let scraper = ScraperReporter::new("hostmetrics", "cpu", &settings);
    let op = scraper.start_metrics_op(&OpContext::background());
    scraper.end_metrics_op(op, 11, None).unwrap();

    let exporter = ExporterReporter::new("otlphttp", &settings);
    let op = exporter.start_logs_op(&OpContext::background());
    exporter.end_logs_op(op, 5, None).unwrap();

    let processor = ProcessorReporter::new("batch", &settings);
    processor.traces_accepted(9).unwrap();

    assert_eq!(sink.record_calls(), 0);
    // spans are produced regardless of the counter gate
    let names: Vec<_> = sink.spans().into_iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![
            "receiver/otlp/TraceDataReceived",
            "scraper/hostmetrics/cpu/MetricsScraped",
            "exporter/otlphttp/logs",
        ]
    );
}

#[test]
fn exporter_names_cover_all_signals() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ExporterReporter::new("kafka", &settings);

    let op = reporter.start_traces_op(&OpContext::background());
    reporter.end_traces_op(op, 1, None).unwrap();
    let op = reporter.start_metrics_op(&OpContext::background());
    reporter.end_metrics_op(op, 2, None).unwrap();
    let op = reporter.start_logs_op(&OpContext::background());
    reporter.end_logs_op(op, 3, None).unwrap();

    let names: Vec<_> = sink.spans().into_iter().map(|s| s.name).collect();
    assert_eq!(
        names,
        vec![
            "exporter/kafka/traces",
            "exporter/kafka/metrics",
            "exporter/kafka/logs",
        ]
    );

    let tags = [("exporter", "kafka")];
    assert_eq!(sink.counter("exporter/sent_spans", &tags), 1);
    assert_eq!(sink.counter("exporter/sent_metric_points", &tags), 2);
    assert_eq!(sink.counter("exporter/sent_log_records", &tags), 3);
    assert_eq!(sink.counter("exporter/send_failed_spans", &tags), 0);
}

#[test]
fn sink_errors_propagate_from_end_ops_and_processor_calls() {
    let settings = failing_settings();

    let receiver = ReceiverReporter::new("otlp", "grpc", &settings);
    let op = receiver.start_traces_op(&OpContext::background());
    let err = receiver.end_traces_op(op, "otlp", 1, None).unwrap_err();
    assert!(matches!(err, Error::Sink(_)));
    assert_eq!(err.to_string(), "counter sink: measurement store unavailable");

    let scraper = ScraperReporter::new("hostmetrics", "cpu", &settings);
    let op = scraper.start_metrics_op(&OpContext::background());
    assert!(scraper.end_metrics_op(op, 4, None).is_err());

    let exporter = ExporterReporter::new("otlphttp", &settings);
    let op = exporter.start_logs_op(&OpContext::background());
    assert!(exporter.end_logs_op(op, 4, None).is_err());

    let processor = ProcessorReporter::new("batch", &settings);
    assert!(matches!(
        processor.traces_refused(5),
        Err(Error::Sink(_))
    ));
    assert!(processor.metrics_accepted(5).is_err());
    assert!(processor.logs_dropped(5).is_err());
}

#[test]
fn dropped_metric_points_tolerate_sink_errors() {
    let settings = failing_settings();
    let processor = ProcessorReporter::new("batch", &settings);

    // the one counter path that swallows sink failures
    assert!(processor.metrics_dropped(5).is_ok());
    // neighboring dropped paths still propagate
    assert!(processor.traces_dropped(5).is_err());
    assert!(processor.logs_dropped(5).is_err());
}

#[test]
fn failing_sink_is_never_touched_at_verbosity_none() {
    let sink = Arc::new(FailingSink);
    let settings = TelemetrySettings::new(VerbosityLevel::None, sink.clone(), sink);

    let receiver = ReceiverReporter::new("otlp", "grpc", &settings);
    let op = receiver.start_traces_op(&OpContext::background());
    assert!(receiver.end_traces_op(op, "otlp", 1, None).is_ok());

    let processor = ProcessorReporter::new("batch", &settings);
    assert!(processor.traces_refused(5).is_ok());
}

#[test]
fn receiver_records_format_and_transport_per_operation() {
    let (sink, settings) = memory_settings(VerbosityLevel::Normal);
    let reporter = ReceiverReporter::new("otlp", "http", &settings);

    let op = reporter.start_metrics_op(&OpContext::background());
    reporter.end_metrics_op(op, "otlp", 1, None).unwrap();
    let op = reporter.start_metrics_op(&OpContext::background());
    reporter.end_metrics_op(op, "prometheus", 1, None).unwrap();

    let spans = sink.spans();
    assert_eq!(
        spans[0].attributes.get("format"),
        Some(&obsreport::Value::String("otlp".into()))
    );
    assert_eq!(
        spans[1].attributes.get("format"),
        Some(&obsreport::Value::String("prometheus".into()))
    );
    for span in &spans {
        assert_eq!(
            span.attributes.get("transport"),
            Some(&obsreport::Value::String("http".into()))
        );
    }
}
