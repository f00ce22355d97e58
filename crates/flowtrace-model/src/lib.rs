//! Flowtrace domain model
//!
//! Types describing one tracked fulfillment unit (a "flow") and its progress
//! through a family's fixed stage sequence, plus the per-day aggregate chart
//! series. Records are never constructed here from scratch: they arrive from
//! the remote query service and this crate's only lifecycle responsibility is
//! validating the wire shape into the model.

use thiserror::Error;

pub mod chart;
pub mod family;
pub mod record;

pub use chart::{ChartSeries, DailyCount};
pub use family::{FlowFamily, Stage};
pub use record::{
    FlowRecord, OrderInfo, OutboundCompletion, StageCompletion, StageUser, WireFlowRecord,
};

/// Result type for model validation
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors produced when a raw wire object fails validation against the model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The record carries no tracking code
    #[error("flow record is missing its tracking code")]
    MissingTracking,

    /// The record carries no order metadata; no flow exists without an order
    #[error("flow record '{tracking}' has no order metadata")]
    MissingOrder { tracking: String },

    /// A stage completion is present but one of its required fields is not
    #[error("flow record '{tracking}': stage '{stage}' is missing field '{field}'")]
    IncompleteStage {
        tracking: String,
        stage: Stage,
        field: &'static str,
    },
}

/// Non-fatal cross-field inconsistencies detected in otherwise well-formed data.
///
/// Warnings ride alongside the best-effort result; they never replace it.
/// Displaying inconsistent aggregate data is preferable to showing nothing,
/// but the inconsistency must stay inspectable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// A later stage was completed before an earlier one in the family sequence
    #[error("flow '{tracking}': stage '{later}' completed before stage '{earlier}'")]
    OutOfOrderStages {
        tracking: String,
        earlier: Stage,
        later: Stage,
    },

    /// The reported chart total does not match the recomputed sum of daily counts
    #[error("chart total {reported} does not match recomputed sum {computed}")]
    TotalMismatch { reported: u64, computed: u64 },

    /// A calendar day is absent from a non-empty chart series
    #[error("chart series has no entry for {date}")]
    MissingDay { date: chrono::NaiveDate },
}
