//! Transport seam between the SDK and a gateway node.
//!
//! [`ReadGateway`] covers the indexing side (GraphQL queries and raw payload
//! fetches), [`WriteGateway`] the append side (posting one new immutable
//! entry). [`HttpGateway`] implements both over HTTP; the in-process
//! [`MockGateway`](crate::mock::MockGateway) implements them for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tessera_gateway_types::{QueryData, QueryResponse, Tag};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{GatewaySnafu, Result, TransportSnafu};
use crate::query::GqlQuery;
use crate::retry::with_retry;

/// Read side of a gateway node.
#[async_trait]
pub trait ReadGateway: Send + Sync {
    /// Executes one query and returns the shape-polymorphic `data` object.
    async fn query(&self, query: &GqlQuery) -> Result<QueryData>;

    /// Fetches the opaque payload stored with an entry.
    async fn fetch_payload(&self, id: &str) -> Result<String>;
}

/// Write side of a gateway node.
///
/// Signing and key management happen behind this seam; the SDK only hands
/// over tags and a payload and receives the assigned entry id.
#[async_trait]
pub trait WriteGateway: Send + Sync {
    /// Appends one new immutable entry; returns its id.
    async fn post_entry(&self, entry: &NewEntry) -> Result<String>;
}

/// One new immutable entry to append to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// Indexable name/value tags.
    pub tags: Vec<Tag>,
    /// Opaque payload body.
    pub payload: String,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostReceipt {
    id: String,
}

/// HTTP implementation of both gateway sides.
///
/// Queries go to `{endpoint}/graphql`, payloads come from `{endpoint}/{id}`,
/// and new entries are posted to `{endpoint}/entries`. Reads are retried per
/// the configured [`RetryPolicy`](crate::config::RetryPolicy); writes are
/// never retried, since the write endpoint has no idempotency tokens and a
/// replay would append a duplicate entry.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    graphql_url: String,
}

impl HttpGateway {
    /// Builds the HTTP client from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Transport`](crate::error::SdkError::Transport) if
    /// the underlying client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent())
            .build()
            .context(TransportSnafu)?;

        let graphql_url = format!("{}/graphql", config.endpoint());
        Ok(Self { http, config, graphql_url })
    }

    async fn post_graphql(&self, text: &str) -> Result<QueryData> {
        debug!(url = %self.graphql_url, "executing query");

        let response = self
            .http
            .post(&self.graphql_url)
            .json(&GraphqlRequest { query: text })
            .send()
            .await
            .context(TransportSnafu)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return GatewaySnafu { status, message }.fail();
        }

        let envelope: QueryResponse = response.json().await.context(TransportSnafu)?;
        interpret_envelope(status, envelope)
    }
}

/// Unwraps the response envelope, surfacing query-level errors.
fn interpret_envelope(status: u16, envelope: QueryResponse) -> Result<QueryData> {
    if let Some(errors) = envelope.errors.as_deref().filter(|errors| !errors.is_empty()) {
        let message =
            errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ");
        return GatewaySnafu { status, message }.fail();
    }
    Ok(envelope.data.unwrap_or_default())
}

#[async_trait]
impl ReadGateway for HttpGateway {
    async fn query(&self, query: &GqlQuery) -> Result<QueryData> {
        let text = query.render()?;
        with_retry(self.config.retry_policy(), || self.post_graphql(&text)).await
    }

    async fn fetch_payload(&self, id: &str) -> Result<String> {
        let url = format!("{}/{id}", self.config.endpoint());
        with_retry(self.config.retry_policy(), || async {
            debug!(%url, "fetching payload");

            let response = self.http.get(&url).send().await.context(TransportSnafu)?;
            let status = response.status().as_u16();
            if !response.status().is_success() {
                let message = response.text().await.unwrap_or_default();
                return GatewaySnafu { status, message }.fail();
            }
            response.text().await.context(TransportSnafu)
        })
        .await
    }
}

#[async_trait]
impl WriteGateway for HttpGateway {
    async fn post_entry(&self, entry: &NewEntry) -> Result<String> {
        let url = format!("{}/entries", self.config.endpoint());
        debug!(%url, tags = entry.tags.len(), "posting entry");

        let response =
            self.http.post(&url).json(entry).send().await.context(TransportSnafu)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return GatewaySnafu { status, message }.fail();
        }

        let receipt: PostReceipt = response.json().await.context(TransportSnafu)?;
        Ok(receipt.id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tessera_gateway_types::GraphqlError;

    use super::*;
    use crate::error::SdkError;

    #[test]
    fn test_gateway_urls_derive_from_endpoint() {
        let config =
            GatewayConfig::builder().with_endpoint("https://gateway.example.org/").build().unwrap();
        let gateway = HttpGateway::new(config).unwrap();

        assert_eq!(gateway.graphql_url, "https://gateway.example.org/graphql");
    }

    #[test]
    fn test_interpret_envelope_unwraps_data() {
        let envelope: QueryResponse =
            serde_json::from_str(r#"{"data": {"transactions": {"edges": []}}}"#).unwrap();

        let data = interpret_envelope(200, envelope).unwrap();
        assert!(data.transactions.is_some());
    }

    #[test]
    fn test_interpret_envelope_missing_data_is_empty() {
        let data = interpret_envelope(200, QueryResponse::default()).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_interpret_envelope_surfaces_query_errors() {
        let envelope = QueryResponse {
            data: None,
            errors: Some(vec![
                GraphqlError { message: "unknown argument".to_owned() },
                GraphqlError { message: "syntax".to_owned() },
            ]),
        };

        let err = interpret_envelope(200, envelope).unwrap_err();
        match err {
            SdkError::Gateway { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "unknown argument; syntax");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_error_list_is_not_an_error() {
        let envelope = QueryResponse { data: None, errors: Some(vec![]) };
        assert!(interpret_envelope(200, envelope).is_ok());
    }

    #[test]
    fn test_graphql_request_body_shape() {
        let body = serde_json::to_string(&GraphqlRequest { query: "query { x }" }).unwrap();
        assert_eq!(body, r#"{"query":"query { x }"}"#);
    }
}
