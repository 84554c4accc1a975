//! Typed search sessions.
//!
//! A [`Search`] is one in-progress search against the gateway: the filter
//! state, the field selection, and the continuation cursor. The shape of the
//! search is a type parameter, so each of the four query shapes exposes only
//! the setters its root accepts; a height bound on a transaction search or a
//! tag filter on a block search does not compile.
//!
//! Sessions are created by the client ([`transactions()`], [`transaction(id)`],
//! [`blocks()`], [`block(id)`]) and start from an empty spec with no cursor.
//! Setters consume and return the session for chaining; terminals borrow it
//! mutably so the stored cursor survives for [`next()`](Search::next).
//!
//! ```no_run
//! # use tessera_gateway_sdk::GatewayClient;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = GatewayClient::connect("https://gateway.example.net")?;
//! let mut search = client.transactions().app_name("tessera-notes").limit(25);
//!
//! let first_page = search.find().await?;
//! let second_page = search.next().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`transactions()`]: crate::client::GatewayClient::transactions
//! [`transaction(id)`]: crate::client::GatewayClient::transaction
//! [`blocks()`]: crate::client::GatewayClient::blocks
//! [`block(id)`]: crate::client::GatewayClient::block

use std::marker::PhantomData;

use tessera_gateway_types::{
    BlockRecord, QueryData, SortOrder, TagFilter, TransactionRecord,
};
use tracing::warn;

use crate::catalog::{Field, FieldSelection};
use crate::client::GatewayClient;
use crate::error::Result;
use crate::models::{BlockView, TransactionView};
use crate::query::{GqlQuery, QueryArgs, QueryKind};

/// Page size used when a list session never set one.
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page the gateway serves; also the page size of exhaustive runs.
const MAX_PAGE_SIZE: u64 = 100;

mod sealed {
    pub trait Sealed {}
}

// ============================================================================
// Shape markers
// ============================================================================

/// A query shape a session can take. Implemented only by the four marker
/// types in this module.
pub trait SearchKind: sealed::Sealed {
    /// The structured shape this marker renders as.
    const KIND: QueryKind;
}

/// A paginated shape: carries list filters and the continuation cursor.
pub trait ListKind: SearchKind {
    /// The decoded record type behind each edge.
    type Record;
    /// The read view handed back to callers.
    type View: From<Self::Record>;

    /// Pulls this shape's connection out of the response, normalized to a
    /// page flag and `(cursor, record)` pairs.
    fn page(data: QueryData) -> Option<(bool, Vec<(String, Self::Record)>)>;
}

/// A single-entity shape: renders the id alone and returns at most one record.
pub trait SingleKind: SearchKind {
    /// The decoded record type.
    type Record;
    /// The read view handed back to callers.
    type View: From<Self::Record>;

    /// Pulls this shape's entity out of the response.
    fn entity(data: QueryData) -> Option<Self::Record>;
}

/// A shape whose rendered fieldset follows the session's field selection.
/// Block shapes are fixed and do not implement this.
pub trait Projectable: SearchKind {}

/// Marker for `transactions` list sessions.
#[derive(Debug, Clone, Copy)]
pub struct TransactionList;

/// Marker for single `transaction` lookups.
#[derive(Debug, Clone, Copy)]
pub struct SingleTransaction;

/// Marker for `blocks` list sessions.
#[derive(Debug, Clone, Copy)]
pub struct BlockList;

/// Marker for single `block` lookups.
#[derive(Debug, Clone, Copy)]
pub struct SingleBlock;

impl sealed::Sealed for TransactionList {}
impl SearchKind for TransactionList {
    const KIND: QueryKind = QueryKind::TransactionList;
}
impl ListKind for TransactionList {
    type Record = TransactionRecord;
    type View = TransactionView;

    fn page(data: QueryData) -> Option<(bool, Vec<(String, TransactionRecord)>)> {
        let connection = data.transactions?;
        let edges = connection.edges.into_iter().map(|edge| (edge.cursor, edge.node)).collect();
        Some((connection.page_info.has_next_page, edges))
    }
}
impl Projectable for TransactionList {}

impl sealed::Sealed for SingleTransaction {}
impl SearchKind for SingleTransaction {
    const KIND: QueryKind = QueryKind::SingleTransaction;
}
impl SingleKind for SingleTransaction {
    type Record = TransactionRecord;
    type View = TransactionView;

    fn entity(data: QueryData) -> Option<TransactionRecord> {
        data.transaction
    }
}
impl Projectable for SingleTransaction {}

impl sealed::Sealed for BlockList {}
impl SearchKind for BlockList {
    const KIND: QueryKind = QueryKind::BlockList;
}
impl ListKind for BlockList {
    type Record = BlockRecord;
    type View = BlockView;

    fn page(data: QueryData) -> Option<(bool, Vec<(String, BlockRecord)>)> {
        let connection = data.blocks?;
        let edges = connection.edges.into_iter().map(|edge| (edge.cursor, edge.node)).collect();
        Some((connection.page_info.has_next_page, edges))
    }
}

impl sealed::Sealed for SingleBlock {}
impl SearchKind for SingleBlock {
    const KIND: QueryKind = QueryKind::SingleBlock;
}
impl SingleKind for SingleBlock {
    type Record = BlockRecord;
    type View = BlockView;

    fn entity(data: QueryData) -> Option<BlockRecord> {
        data.block
    }
}

// ============================================================================
// Session
// ============================================================================

/// One in-progress search of shape `K`.
pub struct Search<'a, K: SearchKind> {
    client: &'a GatewayClient,
    args: QueryArgs,
    selection: FieldSelection,
    cursor: Option<String>,
    _kind: PhantomData<K>,
}

impl<'a, K: SearchKind> Search<'a, K> {
    pub(crate) fn new(client: &'a GatewayClient) -> Self {
        Self {
            client,
            args: QueryArgs::default(),
            selection: FieldSelection::default(),
            cursor: None,
            _kind: PhantomData,
        }
    }

    pub(crate) fn with_id(client: &'a GatewayClient, id: impl Into<String>) -> Self {
        let mut search = Self::new(client);
        search.args.id = Some(id.into());
        search
    }
}

// ============================================================================
// List filter setters
// ============================================================================

impl<K: ListKind> Search<'_, K> {
    /// Narrows the search to a single entry id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.args.ids = vec![id.into()];
        self
    }

    /// Narrows the search to a set of entry ids.
    #[must_use]
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the page size.
    ///
    /// Zero is raised to 1 with a warning. Values above 100 are kept as
    /// given with a warning; the gateway caps a page at 100 entries either
    /// way.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        let limit = if limit < 1 {
            warn!("page size cannot be below 1, using 1");
            1
        } else {
            if limit > MAX_PAGE_SIZE {
                warn!(requested = limit, "the gateway returns at most 100 entries per page");
            }
            limit
        };
        self.args.first = Some(limit);
        self
    }

    /// Sets the result ordering. Default is newest first.
    #[must_use]
    pub fn sort(mut self, order: SortOrder) -> Self {
        self.args.sort = Some(order);
        self
    }

    /// Starts the search after an opaque cursor from an earlier page.
    #[must_use]
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.args.after = Some(cursor.into());
        self
    }

    /// The continuation cursor stored by the last executed page, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }
}

impl Search<'_, TransactionList> {
    /// Appends one tag filter. Distinct filters are ANDed by the gateway;
    /// the values of one filter are ORed.
    #[must_use]
    pub fn tag<S, I, V>(mut self, name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.args.tags.push(TagFilter::new(name, values));
        self
    }

    /// Replaces the whole tag filter list.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = TagFilter>) -> Self {
        self.args.tags = tags.into_iter().collect();
        self
    }

    /// Filters by the conventional `App-Name` tag.
    #[must_use]
    pub fn app_name(self, name: impl Into<String>) -> Self {
        self.tag("App-Name", [name.into()])
    }

    /// Filters by the conventional `Content-Type` tag.
    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.tag("Content-Type", [content_type.into()])
    }

    /// Filters by sending addresses.
    #[must_use]
    pub fn from<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    /// Filters by receiving addresses.
    #[must_use]
    pub fn to<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }
}

impl Search<'_, BlockList> {
    /// Sets the lower height bound, keeping any upper bound.
    #[must_use]
    pub fn min_height(mut self, height: u64) -> Self {
        self.args.height.min = Some(height);
        self
    }

    /// Sets the upper height bound, keeping any lower bound.
    #[must_use]
    pub fn max_height(mut self, height: u64) -> Self {
        self.args.height.max = Some(height);
        self
    }
}

// ============================================================================
// Projection
// ============================================================================

impl<K: Projectable> Search<'_, K> {
    /// Replaces the field selection with the closure of `fields`.
    #[must_use]
    pub fn only(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.selection = FieldSelection::of(fields);
        self
    }

    /// Removes `fields` and their closure from the selection.
    #[must_use]
    pub fn exclude(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.selection.remove_all(fields);
        self
    }

    /// Dotted-token variant of [`only`](Self::only). Unknown tokens are
    /// dropped with a warning.
    #[must_use]
    pub fn only_tokens<'t>(mut self, tokens: impl IntoIterator<Item = &'t str>) -> Self {
        self.selection = FieldSelection::of_tokens(tokens);
        self
    }

    /// Dotted-token variant of [`exclude`](Self::exclude).
    #[must_use]
    pub fn exclude_tokens<'t>(mut self, tokens: impl IntoIterator<Item = &'t str>) -> Self {
        self.selection.remove_tokens(tokens);
        self
    }
}

// ============================================================================
// Terminals
// ============================================================================

impl<K: ListKind> Search<'_, K> {
    /// Fetches one page, defaulting the page size to 10.
    ///
    /// Stores the last edge's cursor for [`next()`](Self::next).
    ///
    /// # Errors
    ///
    /// Propagates builder-side errors; wire failures yield an empty page.
    pub async fn find(&mut self) -> Result<Vec<K::View>> {
        let first = *self.args.first.get_or_insert(DEFAULT_PAGE_SIZE);
        let after = self.args.after.clone();
        let (views, _) = self.run_page(first, after).await?;
        Ok(views)
    }

    /// Fetches the first matching entity, forcing a page size of 1.
    ///
    /// # Errors
    ///
    /// Propagates builder-side errors; wire failures yield `None`.
    pub async fn find_one(&mut self) -> Result<Option<K::View>> {
        self.args.first = Some(1);
        let after = self.args.after.clone();
        let (views, _) = self.run_page(1, after).await?;
        Ok(views.into_iter().next())
    }

    /// Fetches every matching entity, walking full pages until the gateway
    /// reports no further page.
    ///
    /// A page with no edges ends the walk even if the gateway claims more;
    /// without an edge there is no cursor to advance with. Wire failures
    /// mid-walk end it too, returning what accumulated.
    ///
    /// # Errors
    ///
    /// Propagates builder-side errors.
    pub async fn find_all(&mut self) -> Result<Vec<K::View>> {
        self.args.first = Some(MAX_PAGE_SIZE);
        let mut all = Vec::new();
        let mut after = self.args.after.clone();

        loop {
            let (views, has_next_page) = self.run_page(MAX_PAGE_SIZE, after).await?;
            if views.is_empty() {
                break;
            }
            all.extend(views);
            if !has_next_page {
                break;
            }
            after = self.cursor.clone();
            if after.is_none() {
                break;
            }
        }

        Ok(all)
    }

    /// Fetches the page after the last one, using the stored cursor.
    ///
    /// With no stored cursor (nothing fetched yet, or the result set is
    /// exhausted) this warns and returns an empty page without issuing a
    /// request.
    ///
    /// # Errors
    ///
    /// Propagates builder-side errors; wire failures yield an empty page.
    pub async fn next(&mut self) -> Result<Vec<K::View>> {
        let Some(cursor) = self.cursor.clone() else {
            warn!("no continuation cursor, nothing more to fetch");
            return Ok(Vec::new());
        };

        let first = self.args.first.unwrap_or(DEFAULT_PAGE_SIZE);
        let (views, _) = self.run_page(first, Some(cursor)).await?;
        Ok(views)
    }

    /// Executes one page and refreshes the stored cursor from its edges.
    async fn run_page(&mut self, first: u64, after: Option<String>) -> Result<(Vec<K::View>, bool)> {
        let args = QueryArgs {
            first: Some(first),
            sort: Some(self.args.sort.unwrap_or_default()),
            after: Some(after.unwrap_or_default()),
            ..self.args.clone()
        };
        let query = GqlQuery::new(K::KIND, args, self.selection.clone());

        let Some(data) = self.client.run_query(&query).await? else {
            self.cursor = None;
            return Ok((Vec::new(), false));
        };
        let Some((has_next_page, edges)) = K::page(data) else {
            self.cursor = None;
            return Ok((Vec::new(), false));
        };

        self.cursor = edges.last().map(|(cursor, _)| cursor.clone());
        let views = edges.into_iter().map(|(_, record)| K::View::from(record)).collect();
        Ok((views, has_next_page))
    }
}

impl<K: SingleKind> Search<'_, K> {
    /// Executes the single-entity lookup. Shared body of the `find_one`
    /// terminals below; those are inherent on the concrete markers because
    /// a generic impl would collide with the list-kind `find_one`.
    async fn run_single(&self) -> Result<Option<K::View>> {
        let query = GqlQuery::new(K::KIND, self.args.clone(), self.selection.clone());
        let Some(data) = self.client.run_query(&query).await? else {
            return Ok(None);
        };
        Ok(K::entity(data).map(K::View::from))
    }
}

impl Search<'_, SingleTransaction> {
    /// Fetches the entity this session was opened for.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidQuery`](crate::error::SdkError::InvalidQuery)
    /// when the session was opened with an empty id; wire failures and
    /// unknown ids yield `None`.
    pub async fn find_one(&self) -> Result<Option<TransactionView>> {
        self.run_single().await
    }
}

impl Search<'_, SingleBlock> {
    /// Fetches the entity this session was opened for.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::InvalidQuery`](crate::error::SdkError::InvalidQuery)
    /// when the session was opened with an empty id; wire failures and
    /// unknown ids yield `None`.
    pub async fn find_one(&self) -> Result<Option<BlockView>> {
        self.run_single().await
    }
}
