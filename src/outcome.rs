use std::error::Error as StdError;
use thiserror::Error;

use crate::types::SpanStatus;

/// An error reporting that only some sub-units of a batch failed.
///
/// Detected by the classifier through a downcast rather than a type
/// hierarchy, so any call site can produce one without depending on the
/// reporters. For scrape operations `rejected` counts errored scrape
/// targets; elsewhere the whole batch is treated as failed because the
/// error still reached the caller.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PartialFailure {
    rejected: usize,
    message: String,
}

impl PartialFailure {
    /// Create a partial failure with the number of rejected sub-units.
    pub fn new(rejected: usize, message: impl Into<String>) -> PartialFailure {
        PartialFailure {
            rejected,
            message: message.into(),
        }
    }

    /// Number of sub-units that failed.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

/// The pipeline role an operation ran under, which decides how partial
/// failures are counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Receive,
    Scrape,
    Export,
}

/// Success/failure accounting and span status derived from one result.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Outcome {
    pub success: i64,
    pub failure: i64,
    pub status: SpanStatus,
}

/// Turn `(item_count, err)` into an [`Outcome`].
///
/// Pure and total: any error value maps to some outcome. Scrape is the one
/// role where a [`PartialFailure`] counts errored sub-targets instead of
/// items.
pub(crate) fn classify(
    role: Role,
    item_count: usize,
    err: Option<&(dyn StdError + 'static)>,
) -> Outcome {
    let err = match err {
        None => {
            return Outcome {
                success: item_count as i64,
                failure: 0,
                status: SpanStatus::Unset,
            }
        }
        Some(err) => err,
    };

    let status = SpanStatus::Error(err.to_string());

    match err.downcast_ref::<PartialFailure>() {
        Some(partial) if role == Role::Scrape => Outcome {
            success: item_count as i64,
            failure: partial.rejected() as i64,
            status,
        },
        _ => Outcome {
            success: 0,
            failure: item_count as i64,
            status,
        },
    }
}
