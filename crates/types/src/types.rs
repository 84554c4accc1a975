//! Record, envelope, and filter types for the gateway wire format.
//!
//! Every field a caller may leave out of its selection deserializes as
//! `Option`, so a narrowed query still decodes cleanly into the same record
//! types.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Tags
// ============================================================================

/// A name/value pair attached to a ledger entry at creation time.
///
/// Tags are both free-form metadata and, for the document layer, the encoded
/// form of indexed document fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A query-side tag predicate.
///
/// Distinct filters are ANDed together; the values of one filter are ORed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl TagFilter {
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self { name: name.into(), values: values.into_iter().map(Into::into).collect() }
    }
}

// ============================================================================
// Entry Records
// ============================================================================

/// The signing wallet of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// A currency amount, reported both in the base unit and in tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    #[serde(default)]
    pub winston: Option<String>,
    #[serde(default)]
    pub ar: Option<String>,
}

/// Metadata about a transaction's data payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMeta {
    #[serde(default)]
    pub size: Option<u64>,
    /// MIME type of the payload. Wire name is `type`.
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
}

/// Reference to a bundling parent transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default)]
    pub id: Option<String>,
}

/// A block record, as returned standalone by the block queries or embedded
/// in a transaction for its confirming block.
///
/// `timestamp` is Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// A transaction record as the gateway indexes it.
///
/// An unmined transaction has `block: None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub fee: Option<Amount>,
    #[serde(default)]
    pub quantity: Option<Amount>,
    #[serde(default)]
    pub data: Option<DataMeta>,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub block: Option<BlockRecord>,
    #[serde(default)]
    pub parent: Option<Parent>,
}

impl TransactionRecord {
    /// Looks up the value of the first tag with the given name.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .as_deref()?
            .iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value.as_str())
    }
}

// ============================================================================
// Pagination Envelope
// ============================================================================

/// Page metadata for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
}

/// One element of a transaction list page, carrying its resume cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEdge {
    pub cursor: String,
    pub node: TransactionRecord,
}

/// One element of a block list page, carrying its resume cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEdge {
    pub cursor: String,
    pub node: BlockRecord,
}

/// A page of transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionConnection {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<TransactionEdge>,
}

/// A page of blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockConnection {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<BlockEdge>,
}

// ============================================================================
// Response Body
// ============================================================================

/// The shape-polymorphic `data` object of a gateway response.
///
/// Exactly one field is populated for a well-formed response; all four absent
/// means "no result".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub transaction: Option<TransactionRecord>,
    #[serde(default)]
    pub transactions: Option<TransactionConnection>,
    #[serde(default)]
    pub block: Option<BlockRecord>,
    #[serde(default)]
    pub blocks: Option<BlockConnection>,
}

impl QueryData {
    /// True when no shape is populated.
    pub fn is_empty(&self) -> bool {
        self.transaction.is_none()
            && self.transactions.is_none()
            && self.block.is_none()
            && self.blocks.is_none()
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

/// The top-level GraphQL response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

// ============================================================================
// Query Primitives
// ============================================================================

/// Result ordering by block height.
///
/// Unmined entries sort as newest; the gateway default is descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    HeightDescending,
    HeightAscending,
}

impl SortOrder {
    /// The unquoted GraphQL enum token for this ordering.
    pub const fn token(self) -> &'static str {
        match self {
            Self::HeightDescending => "HEIGHT_DESC",
            Self::HeightAscending => "HEIGHT_ASC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// An inclusive block-height window for block list queries.
///
/// Bounds are set independently and accumulate; setting `min` twice replaces
/// only `min`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl HeightRange {
    /// True when neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// True when `height` falls inside the window.
    pub fn contains(&self, height: u64) -> bool {
        self.min.is_none_or(|min| height >= min) && self.max.is_none_or(|max| height <= max)
    }
}
