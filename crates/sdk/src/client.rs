//! Gateway client and query dispatch.
//!
//! [`GatewayClient`] is a cheap cloneable handle over a [`ReadGateway`].
//! It opens the typed search sessions and executes their queries, turning
//! wire-level failures into empty results so read flows degrade instead of
//! aborting mid-pagination.

use std::sync::Arc;

use tessera_gateway_types::QueryData;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::gateway::{HttpGateway, ReadGateway};
use crate::query::GqlQuery;
use crate::search::{BlockList, Search, SingleBlock, SingleTransaction, TransactionList};

/// Client handle for one gateway endpoint.
///
/// Every search starts from one of the four session constructors:
/// [`transactions()`](Self::transactions), [`transaction(id)`](Self::transaction),
/// [`blocks()`](Self::blocks), or [`block(id)`](Self::block). A session owns
/// its filter state and continuation cursor; the client itself is immutable
/// and clones share the underlying transport, so one client can serve any
/// number of concurrent sessions.
///
/// # Example
///
/// ```no_run
/// # use tessera_gateway_sdk::GatewayClient;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GatewayClient::connect("https://gateway.example.net")?;
///
/// let latest = client
///     .transactions()
///     .app_name("tessera-notes")
///     .limit(20)
///     .find()
///     .await?;
///
/// for entry in &latest {
///     println!("{:?} from {:?}", entry.id(), entry.owner());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GatewayClient {
    reader: Arc<dyn ReadGateway>,
}

impl GatewayClient {
    /// Creates a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Transport`](crate::error::SdkError::Transport) if
    /// the HTTP client cannot be constructed.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Ok(Self { reader: Arc::new(HttpGateway::new(config)?) })
    }

    /// Convenience constructor for a single endpoint with default settings.
    ///
    /// For control over timeouts and retries, build a
    /// [`GatewayConfig`](crate::config::GatewayConfig) and use
    /// [`GatewayClient::new`].
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidUrl`](crate::error::SdkError::InvalidUrl)
    /// if the endpoint is not a valid HTTP(S) URL.
    pub fn connect(endpoint: impl Into<String>) -> Result<Self> {
        Self::new(GatewayConfig::builder().with_endpoint(endpoint).build()?)
    }

    /// Creates a client over a caller-supplied transport.
    ///
    /// This is the seam tests use to run the full search stack against the
    /// in-process [`MockGateway`](crate::mock::MockGateway).
    #[must_use]
    pub fn with_reader(reader: Arc<dyn ReadGateway>) -> Self {
        Self { reader }
    }

    // ======================================================================
    // Search sessions
    // ======================================================================

    /// Opens a transaction list session.
    #[must_use]
    pub fn transactions(&self) -> Search<'_, TransactionList> {
        Search::new(self)
    }

    /// Opens a single-transaction lookup for `id`.
    #[must_use]
    pub fn transaction(&self, id: impl Into<String>) -> Search<'_, SingleTransaction> {
        Search::with_id(self, id)
    }

    /// Opens a block list session.
    #[must_use]
    pub fn blocks(&self) -> Search<'_, BlockList> {
        Search::new(self)
    }

    /// Opens a single-block lookup for `id`.
    #[must_use]
    pub fn block(&self, id: impl Into<String>) -> Search<'_, SingleBlock> {
        Search::with_id(self, id)
    }

    /// Fetches the opaque payload stored with an entry.
    ///
    /// Unlike query execution, payload fetches are not softened into empty
    /// results; the caller asked for one specific entry's bytes and gets the
    /// failure if they cannot be served.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::Gateway`](crate::error::SdkError::Gateway) for
    /// HTTP-level failures (including a 404 for an unknown entry) and
    /// [`SdkError::Transport`](crate::error::SdkError::Transport) when the
    /// request could not be completed.
    pub async fn fetch_payload(&self, id: &str) -> Result<String> {
        self.reader.fetch_payload(id).await
    }

    /// Validates and executes one query.
    ///
    /// Builder-side mistakes surface as hard errors before anything is
    /// dispatched. Wire-side failures come back as `Ok(None)` with a
    /// warning; sessions treat that as an empty page.
    pub(crate) async fn run_query(&self, query: &GqlQuery) -> Result<Option<QueryData>> {
        query.validate()?;
        debug!(shape = query.kind.root(), "running query");

        match self.reader.query(query).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.is_transport_failure() => {
                warn!(error = %err, "query failed, returning an empty result");
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }
}
