use std::thread::{self, JoinHandle};
use tokio::runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::api::Api;
use crate::error::Error;
use crate::span::Span;

use super::{CounterSink, Sample, SpanSink};

enum Batch {
    Spans(Vec<Span>),
    Samples(Vec<Sample>),
}

/// A sink that exports through [`Api`] from a dedicated background thread.
///
/// Reporter calls never block on the network: spans and measurements are
/// handed to the `obsreport-export` thread over an unbounded channel.
/// Dropping the sink closes the channel and joins the thread, flushing
/// whatever is still queued.
pub struct BlockingSink {
    channel: Option<UnboundedSender<Batch>>,
    handle: Option<JoinHandle<()>>,
}

impl BlockingSink {
    /// Spawn the export thread and return the sink.
    pub fn new(api: Api) -> BlockingSink {
        let (tx, mut rx) = unbounded_channel::<Batch>();

        let handle = thread::Builder::new()
            .name("obsreport-export".into())
            .spawn(move || {
                let rt = match runtime::Builder::new_current_thread().enable_all().build() {
                    Err(e) => {
                        eprintln!("Failed to communicate runtime creation failure: {:?}", e);
                        return;
                    }
                    Ok(v) => v,
                };

                rt.block_on(async move {
                    while let Some(batch) = rx.recv().await {
                        match batch {
                            Batch::Spans(spans) => api.send(spans, Vec::new()).await,
                            Batch::Samples(samples) => api.send(Vec::new(), samples).await,
                        }
                    }
                });

                drop(rt);
            })
            .expect("failed to spawn thread");

        BlockingSink {
            channel: Some(tx),
            handle: Some(handle),
        }
    }
}

impl SpanSink for BlockingSink {
    fn report(&self, span: Span) {
        if let Some(channel) = &self.channel {
            if channel.send(Batch::Spans(vec![span])).is_err() {
                log::debug!("span dropped: export thread is gone");
            }
        }
    }
}

impl CounterSink for BlockingSink {
    fn record(
        &self,
        tags: &[(&'static str, &str)],
        measurements: &[(&'static str, i64)],
    ) -> Result<(), Error> {
        let channel = self.channel.as_ref().ok_or(Error::Closed)?;
        channel
            .send(Batch::Samples(Sample::collect(tags, measurements)))
            .map_err(|_| Error::Closed)
    }
}

impl Drop for BlockingSink {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            drop(channel);
        }

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
