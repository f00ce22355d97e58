//! HTTP implementation of the retrieval gateway
//!
//! Issues parameterized requests against the flow tracking service and maps
//! responses back through the model validator. The transport is an explicit
//! dependency: a gateway is built either from a config (owning its own
//! client) or around a caller-supplied `reqwest::Client`, so tests and
//! callers with their own timeout policy can substitute one. Cancellation is
//! by dropping the returned future; no background work continues afterwards.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use flowtrace_model::{ChartSeries, FlowFamily, FlowRecord, WireFlowRecord};

use crate::query::ListQuery;
use crate::{Fetched, FlowPage, FlowService, GatewayError, GatewayResult};

/// Configuration for the HTTP gateway
#[derive(Debug, Clone)]
pub struct FlowGatewayConfig {
    /// Base URL of the flow tracking service
    pub base_url: String,
    /// Timeout in seconds for HTTP requests
    pub timeout_secs: u64,
}

impl Default for FlowGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Gateway to the flow tracking service over HTTP
#[derive(Debug, Clone)]
pub struct HttpFlowGateway {
    base_url: String,
    client: Client,
}

/// Request payload for flow creation
#[derive(Debug, Serialize)]
struct CreateFlowRequest<'a> {
    tracking: &'a str,
}

/// Envelope for list responses
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    data: Vec<WireFlowRecord>,
    page: u32,
    limit: u32,
    total: u64,
}

/// Envelope for single-record responses
#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    data: WireFlowRecord,
}

/// Envelope for chart responses
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    data: ChartSeries,
}

impl HttpFlowGateway {
    /// Creates a gateway with its own HTTP client per the given config
    pub fn new(config: FlowGatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url,
            client,
        }
    }

    /// Creates a gateway around a caller-supplied client.
    ///
    /// The client's own timeout/retry configuration is propagated unchanged;
    /// this gateway mandates no timeout of its own.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn family_endpoint(&self, family: FlowFamily) -> String {
        format!("{}/{}", self.base_url, family.path_segment())
    }

    fn record_endpoint(&self, family: FlowFamily, tracking: &str) -> String {
        format!("{}/{}", self.family_endpoint(family), tracking)
    }

    fn chart_endpoint(&self, family: FlowFamily) -> String {
        format!("{}/chart", self.family_endpoint(family))
    }

    /// Rejects a non-2xx response as a transport failure carrying the status
    async fn fail_on_status(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| format!("status {status}"));
        Err(GatewayError::Transport {
            status: Some(status),
            message,
        })
    }
}

#[async_trait]
impl FlowService for HttpFlowGateway {
    #[instrument(skip(self, query), fields(family = %family))]
    async fn list_flows(
        &self,
        family: FlowFamily,
        query: &ListQuery,
    ) -> GatewayResult<Fetched<FlowPage>> {
        query.validate()?;

        let url = self.family_endpoint(family);
        debug!("Listing flows from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&query.query_pairs())
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        let response = Self::fail_on_status(response).await?;

        let envelope: ListEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("invalid list response: {e}")))?;

        let mut items = Vec::with_capacity(envelope.data.len());
        let mut warnings = Vec::new();
        for raw in envelope.data {
            let record = FlowRecord::from_wire(raw)?;
            warnings.extend(record.stage_anomalies(family));
            items.push(record);
        }

        if !warnings.is_empty() {
            warn!("List of {} flows carries {} integrity warnings", family, warnings.len());
        }

        Ok(Fetched::new(
            FlowPage {
                items,
                page: envelope.page,
                limit: envelope.limit,
                total: envelope.total,
            },
            warnings,
        ))
    }

    #[instrument(skip(self), fields(family = %family, tracking = %tracking))]
    async fn get_flow(
        &self,
        family: FlowFamily,
        tracking: &str,
    ) -> GatewayResult<Fetched<FlowRecord>> {
        let tracking = tracking.trim();
        if tracking.is_empty() {
            return Err(GatewayError::Validation(
                "tracking code must not be empty".to_string(),
            ));
        }

        let url = self.record_endpoint(family, tracking);
        debug!("Fetching flow from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                family,
                tracking: tracking.to_string(),
            });
        }
        let response = Self::fail_on_status(response).await?;

        let envelope: RecordEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("invalid flow response: {e}")))?;

        let record = FlowRecord::from_wire(envelope.data)?;
        let warnings = record.stage_anomalies(family);
        if !warnings.is_empty() {
            warn!("Flow {} carries {} integrity warnings", record.tracking, warnings.len());
        }

        Ok(Fetched::new(record, warnings))
    }

    #[instrument(skip(self), fields(family = %family, tracking = %tracking))]
    async fn create_flow(&self, family: FlowFamily, tracking: &str) -> GatewayResult<FlowRecord> {
        let tracking = tracking.trim();
        if tracking.is_empty() {
            return Err(GatewayError::Validation(
                "tracking code must not be empty".to_string(),
            ));
        }

        let url = self.family_endpoint(family);
        debug!("Creating {} flow for tracking {}", family, tracking);

        let response = self
            .client
            .post(&url)
            .json(&CreateFlowRequest { tracking })
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        let response = Self::fail_on_status(response).await?;

        let envelope: RecordEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("invalid flow response: {e}")))?;

        Ok(FlowRecord::from_wire(envelope.data)?)
    }

    #[instrument(skip(self), fields(family = %family))]
    async fn chart(&self, family: FlowFamily) -> GatewayResult<Fetched<ChartSeries>> {
        let url = self.chart_endpoint(family);
        debug!("Fetching current-period chart from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(GatewayError::from_transport)?;
        let response = Self::fail_on_status(response).await?;

        let envelope: ChartEnvelope = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("invalid chart response: {e}")))?;

        let series = envelope.data;
        let warnings = series.integrity_warnings();
        if !warnings.is_empty() {
            warn!(
                "Chart for {} {} carries {} integrity warnings",
                series.month,
                series.year,
                warnings.len()
            );
        }

        Ok(Fetched::new(series, warnings))
    }
}
