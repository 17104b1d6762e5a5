//! Observability reporting for telemetry pipeline stages
//!
//! # Overview
//!
//! This crate instruments a telemetry pipeline built from receivers,
//! scrapers, processors and exporters. For every unit of work entering or
//! leaving a stage it produces a [`Span`] bracketing the operation with
//! outcome attributes and status, and aggregate tagged counters broken down
//! by stage identity and outcome, gated by a [`VerbosityLevel`] captured at
//! construction.
//!
//! One reporter type exists per pipeline role:
//!
//! - [`ReceiverReporter`] brackets inbound data received over a transport.
//! - [`ScraperReporter`] brackets pull-based metrics scraping.
//! - [`ProcessorReporter`] records accepted/refused/dropped counters only.
//! - [`ExporterReporter`] brackets outbound sends.
//!
//! Spans and measurements flow into shared [sinks](crate::sink); ship them
//! over HTTP with [`BlockingSink`] and [`Api`], aggregate them in memory
//! with [`MemorySink`], or discard them with [`NoopSink`].
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use obsreport::{MemorySink, OpContext, ReceiverReporter, TelemetrySettings, VerbosityLevel};
//!
//! let sink = Arc::new(MemorySink::new());
//! let settings = TelemetrySettings::new(VerbosityLevel::Normal, sink.clone(), sink.clone());
//!
//! let reporter = ReceiverReporter::new("otlp", "grpc", &settings);
//!
//! let op = reporter.start_traces_op(&OpContext::background());
//! // ... receive a batch of 42 spans ...
//! reporter.end_traces_op(op, "otlp", 42, None).unwrap();
//!
//! assert_eq!(
//!     sink.counter(
//!         "receiver/accepted_spans",
//!         &[("receiver", "otlp"), ("transport", "grpc")],
//!     ),
//!     42,
//! );
//! ```
//!
//! Failures are attributed from the error handed to `end_*_op`: a plain
//! error fails the whole batch, while a [`PartialFailure`] on a scrape
//! operation counts errored scrape targets instead of items.
//!
//! # License
//!
//! MIT

#![warn(missing_docs)]

mod api;
mod config;
mod error;
mod exporter;
mod outcome;
mod processor;
mod receiver;
mod scraper;
pub mod sink;
mod span;
mod types;
mod utils;

pub use api::Api;
pub use config::{TelemetryConfig, TelemetrySettings, VerbosityLevel};
pub use error::Error;
pub use exporter::ExporterReporter;
pub use outcome::PartialFailure;
pub use processor::{build_processor_custom_metric_name, ProcessorReporter};
pub use receiver::ReceiverReporter;
pub use scraper::ScraperReporter;
pub use sink::{BlockingSink, CounterSink, MemorySink, NoopSink, Sample, SpanSink};
pub use span::{OpContext, Span, SpanContext};
pub use types::{Attributes, SpanStatus, Value};
