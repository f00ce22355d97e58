//! Flowtrace client
//!
//! Query, aggregation, and retrieval contracts for the remote flow tracking
//! service. The [`FlowService`] trait defines the boundary; [`gateway`] holds
//! the HTTP implementation. The service is the source of truth — this crate
//! never stores anything, it parameterizes requests, validates responses into
//! the model, and keeps the error taxonomy honest: local validation failures
//! never reach the transport, and transport failures are never conflated with
//! decode failures.

use async_trait::async_trait;
use thiserror::Error;

use flowtrace_model::{ChartSeries, FlowFamily, FlowRecord, IntegrityWarning, ModelError};

pub mod gateway;
pub mod query;

pub use gateway::{FlowGatewayConfig, HttpFlowGateway};
pub use query::ListQuery;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors produced by the retrieval gateway.
///
/// `Validation` is raised locally and never sent upstream. `Transport` and
/// `Decode` are kept distinct: the former is a network or status failure, the
/// latter a 2xx response whose body does not match the expected shape. This
/// crate never retries; the status detail on `Transport` is there for the
/// caller's retry policy.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Caller-supplied parameters were malformed; no request was issued
    #[error("invalid request parameters: {0}")]
    Validation(String),

    /// Network failure or non-2xx response status
    #[error("transport failure: {message}")]
    Transport {
        /// Response status, if the request reached the service at all
        status: Option<reqwest::StatusCode>,
        message: String,
    },

    /// The response was 2xx but its body did not match the expected shape
    #[error("response decode failure: {0}")]
    Decode(String),

    /// The service reported that no such flow exists
    #[error("no '{family}' flow found for tracking '{tracking}'")]
    NotFound {
        family: FlowFamily,
        tracking: String,
    },
}

impl GatewayError {
    /// Maps a reqwest-level failure, keeping timeout and connection
    /// failures distinguishable in the message
    fn from_transport(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timeout: {error}")
        } else if error.is_connect() {
            format!("connection error: {error}")
        } else {
            format!("http error: {error}")
        };
        GatewayError::Transport {
            status: error.status(),
            message,
        }
    }
}

impl From<ModelError> for GatewayError {
    fn from(error: ModelError) -> Self {
        GatewayError::Decode(error.to_string())
    }
}

/// A retrieved value together with any integrity warnings detected on receipt.
///
/// Warnings are non-fatal: the operation still returns its best-effort data,
/// and the caller decides what to make of the inconsistency.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub warnings: Vec<IntegrityWarning>,
}

impl<T> Fetched<T> {
    pub fn new(data: T, warnings: Vec<IntegrityWarning>) -> Self {
        Self { data, warnings }
    }

    /// Wraps data that passed every integrity check
    pub fn clean(data: T) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Discards the warnings and keeps the data
    pub fn into_data(self) -> T {
        self.data
    }
}

/// One page of flow records.
///
/// Item order within a page is determined by the upstream service and is
/// treated as opaque here.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPage {
    pub items: Vec<FlowRecord>,
    pub page: u32,
    pub limit: u32,
    /// Total number of records matching the query, across all pages
    pub total: u64,
}

/// Boundary contract for retrieving flow state from the tracking service.
///
/// Both fulfillment families share this contract; every operation is
/// parameterized by [`FlowFamily`]. Implementations hold no cross-request
/// state, and a caller cancels an operation by dropping its future.
#[async_trait]
pub trait FlowService: Send + Sync {
    /// Lists flows for a family, paginated and optionally filtered by
    /// free-text search and an inclusive date range
    async fn list_flows(
        &self,
        family: FlowFamily,
        query: &ListQuery,
    ) -> GatewayResult<Fetched<FlowPage>>;

    /// Fetches a single flow by its tracking code
    async fn get_flow(
        &self,
        family: FlowFamily,
        tracking: &str,
    ) -> GatewayResult<Fetched<FlowRecord>>;

    /// Registers a new flow for the given tracking code
    async fn create_flow(&self, family: FlowFamily, tracking: &str) -> GatewayResult<FlowRecord>;

    /// Retrieves the daily completion chart for the current period.
    ///
    /// The service fixes which month/year "current" means; historical months
    /// cannot be requested through this contract.
    async fn chart(&self, family: FlowFamily) -> GatewayResult<Fetched<ChartSeries>>;
}
