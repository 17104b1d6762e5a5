use flate2::{write::GzEncoder, Compression};
use futures_util::join;
use reqwest::{
    header::{CONTENT_ENCODING, CONTENT_TYPE},
    Client, RequestBuilder,
};
use serde::Serialize;
use std::cmp::max;
use std::time::Duration;
use tokio::time::sleep;

use crate::sink::Sample;
use crate::span::Span;

/// A telemetry ingest endpoint.
///
/// Spans are posted to `<endpoint>/v1/spans` and measurements to
/// `<endpoint>/v1/metrics`, as gzip-compressed JSON batches.
pub struct Api {
    /// Base URL of the ingest service, without a trailing slash.
    pub endpoint: String,
    /// Value of the `Api-Key` header sent with every request.
    pub key: String,
    /// HTTP client used for every request.
    pub client: Client,
}

impl Api {
    /// Create an `Api` with a default client.
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Api {
        Api {
            endpoint: endpoint.into(),
            key: key.into(),
            client: Client::new(),
        }
    }

    pub(crate) async fn send(&self, spans: Vec<Span>, samples: Vec<Sample>) {
        let spans = if spans.is_empty() {
            Vec::new()
        } else {
            vec![SpanBatch { spans }]
        };
        let metrics = if samples.is_empty() {
            Vec::new()
        } else {
            vec![SampleBatch { metrics: samples }]
        };

        let mut span_service = IngestService::new(spans);
        let mut metric_service = IngestService::new(metrics);

        loop {
            use ServiceStatus::*;

            match join!(span_service.send(self), metric_service.send(self)) {
                (Timeout(d1), Timeout(d2)) => sleep(max(d1, d2)).await,

                (Timeout(d), _) | (_, Timeout(d)) => sleep(d).await,

                (Finished, Finished) => return,

                _ => {}
            }
        }
    }
}

enum ServiceStatus {
    // Need to wait before next sending
    Timeout(Duration),

    // Have remaining data to be sent
    Remaining,

    // Finished, either success or failed
    Finished,
}

struct IngestService<T: Sendable> {
    data: Vec<T>,
    // number of items to send each request
    batch_len: usize,
    retry_count: u32,
}

impl<T: Sendable> IngestService<T> {
    fn new(data: Vec<T>) -> Self {
        IngestService {
            batch_len: data.len(),
            data,
            retry_count: 0,
        }
    }

    async fn send(&mut self, api: &Api) -> ServiceStatus {
        // nothing to send
        if self.data.is_empty() {
            return ServiceStatus::Finished;
        }

        let batch = self.batch_len.min(self.data.len());

        let req = match T::build_request(&self.data[0..batch], api) {
            Some(req) => req,
            // unserializable batch: drop it rather than post a partial payload
            None => {
                self.data.drain(0..batch);
                return if self.data.is_empty() {
                    ServiceStatus::Finished
                } else {
                    ServiceStatus::Remaining
                };
            }
        };

        let res = match req.send().await {
            Ok(res) => res,
            Err(e) => {
                log::debug!("telemetry export request failed: {}", e);
                return self.retry();
            }
        };

        match res.status().as_u16() {
            // success
            200..=299 => {
                // reset retry_count
                self.retry_count = 0;

                self.data.drain(0..batch);

                if self.data.is_empty() {
                    ServiceStatus::Finished
                } else {
                    ServiceStatus::Remaining
                }
            }

            400 | 401 | 403 | 404 | 405 | 409 | 410 | 411 => {
                log::warn!("telemetry export rejected: {}", res.status());
                ServiceStatus::Finished
            }

            // The payload was too big.
            413 => {
                if self.batch_len == 1 {
                    log::warn!("telemetry batch of one item still too large, giving up");
                    ServiceStatus::Finished
                } else {
                    self.batch_len = max(1, self.batch_len / 2);
                    ServiceStatus::Remaining
                }
            }

            // The request rate quota has been exceeded.
            429 => {
                let duration = res
                    .headers()
                    .get("retry-after")
                    .and_then(|val| val.to_str().ok())
                    .and_then(|val| val.parse::<u64>().ok())
                    .map(Duration::from_secs);

                match duration {
                    Some(duration) => ServiceStatus::Timeout(duration),
                    _ => ServiceStatus::Finished,
                }
            }

            _ => self.retry(),
        }
    }

    fn retry(&mut self) -> ServiceStatus {
        if self.retry_count == 0 {
            self.retry_count += 1;
            // retry immediately
            ServiceStatus::Timeout(Duration::from_secs(0))
        } else if self.retry_count <= 5 {
            self.retry_count += 1;
            // retry after 2^n seconds
            ServiceStatus::Timeout(Duration::from_secs(2_u64.pow(self.retry_count - 1_u32)))
        } else {
            log::warn!("telemetry export abandoned after {} retries", self.retry_count);
            ServiceStatus::Finished
        }
    }
}

trait Sendable {
    fn build_request(data: &[Self], api: &Api) -> Option<RequestBuilder>
    where
        Self: Sized;
}

#[derive(Serialize)]
struct SpanBatch {
    spans: Vec<Span>,
}

impl Sendable for SpanBatch {
    fn build_request(data: &[SpanBatch], api: &Api) -> Option<RequestBuilder> {
        Some(
            api.client
                .post(format!("{}/v1/spans", api.endpoint))
                .header(CONTENT_TYPE, "application/json")
                .header(CONTENT_ENCODING, "gzip")
                .header("Api-Key", &api.key)
                .body(to_gz(&data)?),
        )
    }
}

#[derive(Serialize)]
struct SampleBatch {
    metrics: Vec<Sample>,
}

impl Sendable for SampleBatch {
    fn build_request(data: &[SampleBatch], api: &Api) -> Option<RequestBuilder> {
        Some(
            api.client
                .post(format!("{}/v1/metrics", api.endpoint))
                .header(CONTENT_TYPE, "application/json")
                .header(CONTENT_ENCODING, "gzip")
                .header("Api-Key", &api.key)
                .body(to_gz(&data)?),
        )
    }
}

// None means the batch cannot be serialized and must not be posted.
#[inline]
fn to_gz<T: Serialize>(data: T) -> Option<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());

    if let Err(e) = serde_json::to_writer(&mut encoder, &data) {
        log::warn!("telemetry payload serialization failed: {}", e);
        return None;
    }

    match encoder.finish() {
        Ok(body) => Some(body),
        Err(e) => {
            log::warn!("telemetry payload compression failed: {}", e);
            None
        }
    }
}
