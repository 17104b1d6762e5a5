use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::error::Error;
use crate::span::Span;

use super::{CounterSink, SpanSink};

/// A sink that keeps everything in memory.
///
/// Finished spans are stored in arrival order; measurements are summed per
/// (name, tag set). Doubles as the simplest real backend and as the test
/// double for asserting reporter behavior.
#[derive(Default)]
pub struct MemorySink {
    spans: Mutex<Vec<Span>>,
    counters: Mutex<HashMap<(String, BTreeMap<String, String>), i64>>,
    record_calls: Mutex<usize>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// All spans reported so far, in arrival order.
    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().unwrap().clone()
    }

    /// Aggregate value of one counter for an exact tag set, 0 if never
    /// written.
    pub fn counter(&self, name: &str, tags: &[(&str, &str)]) -> i64 {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(key, val)| ((*key).to_string(), (*val).to_string()))
            .collect();

        self.counters
            .lock()
            .unwrap()
            .get(&(name.to_string(), tags))
            .copied()
            .unwrap_or(0)
    }

    /// Number of [`CounterSink::record`] calls received.
    pub fn record_calls(&self) -> usize {
        *self.record_calls.lock().unwrap()
    }
}

impl SpanSink for MemorySink {
    fn report(&self, span: Span) {
        self.spans.lock().unwrap().push(span);
    }
}

impl CounterSink for MemorySink {
    fn record(
        &self,
        tags: &[(&'static str, &str)],
        measurements: &[(&'static str, i64)],
    ) -> Result<(), Error> {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(key, val)| ((*key).to_string(), (*val).to_string()))
            .collect();

        let mut counters = self.counters.lock().unwrap();
        for (name, value) in measurements {
            *counters
                .entry(((*name).to_string(), tags.clone()))
                .or_insert(0) += value;
        }

        *self.record_calls.lock().unwrap() += 1;
        Ok(())
    }
}
