use std::error::Error as StdError;
use std::sync::Arc;

use crate::config::{TelemetrySettings, VerbosityLevel};
use crate::error::Error;
use crate::outcome::{classify, Role};
use crate::sink::{CounterSink, SpanSink};
use crate::span::{start_span, OpContext};

const TAG_RECEIVER: &str = "receiver";
const TAG_SCRAPER: &str = "scraper";

const SCRAPED_KEY: &str = "scraped_metric_points";
const ERRORED_KEY: &str = "errored_metric_points";

const SCRAPED_METRIC: &str = "scraper/scraped_metric_points";
const ERRORED_METRIC: &str = "scraper/errored_metric_points";

/// Brackets pull-based metrics scraping for one receiver+scraper pair.
///
/// Scraping fails per target, not per item: a [`PartialFailure`] here
/// counts errored scrape targets in the failure bucket while the success
/// bucket keeps the number of points actually scraped.
///
/// [`PartialFailure`]: crate::PartialFailure
pub struct ScraperReporter {
    receiver_id: String,
    scraper_id: String,
    level: VerbosityLevel,
    spans: Arc<dyn SpanSink>,
    counters: Arc<dyn CounterSink>,
}

impl ScraperReporter {
    /// Create a reporter for `scraper_id` scraping on behalf of `receiver_id`.
    pub fn new(
        receiver_id: impl Into<String>,
        scraper_id: impl Into<String>,
        settings: &TelemetrySettings,
    ) -> ScraperReporter {
        ScraperReporter {
            receiver_id: receiver_id.into(),
            scraper_id: scraper_id.into(),
            level: settings.level,
            spans: settings.spans.clone(),
            counters: settings.counters.clone(),
        }
    }

    /// Start a span bracketing one scrape pass.
    pub fn start_metrics_op(&self, cx: &OpContext) -> OpContext {
        let name = format!(
            "scraper/{}/{}/MetricsScraped",
            self.receiver_id, self.scraper_id
        );
        start_span(cx, name)
    }

    /// End the scrape pass started by [`start_metrics_op`](Self::start_metrics_op).
    pub fn end_metrics_op(
        &self,
        cx: OpContext,
        item_count: usize,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<(), Error> {
        let outcome = classify(Role::Scrape, item_count, err);

        if let Some(mut span) = cx.take_span() {
            span.attributes.insert(SCRAPED_KEY, outcome.success);
            span.attributes.insert(ERRORED_KEY, outcome.failure);
            span.set_status(outcome.status);
            span.update_duration();
            self.spans.report(span);
        }

        if self.level != VerbosityLevel::None {
            self.counters.record(
                &[
                    (TAG_RECEIVER, self.receiver_id.as_str()),
                    (TAG_SCRAPER, self.scraper_id.as_str()),
                ],
                &[
                    (SCRAPED_METRIC, outcome.success),
                    (ERRORED_METRIC, outcome.failure),
                ],
            )?;
        }

        Ok(())
    }
}
