//! Tag encoding for the document layer.
//!
//! Document fields ride on ordinary entry tags under a reserved name prefix,
//! which keeps them reachable through the regular tag filters. Metadata
//! (`_id`, `_v`, `_createdAt`) uses the same prefix. Non-indexed fields are
//! serialized into the entry payload instead, and a document with nothing to
//! put there still posts a short random filler because the ledger rejects
//! empty payloads.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use tessera_gateway_types::{Tag, TagFilter, TransactionRecord};

use crate::gateway::NewEntry;
use crate::schema::descriptor::DocumentSchema;
use crate::schema::document::{FieldValue, Fields};

/// Reserved tag-name prefix marking document fields.
pub const TAG_PREFIX: &str = "__%$";

/// Metadata field names, stored prefixed like any other field.
pub(crate) const ID_FIELD: &str = "_id";
pub(crate) const VERSION_FIELD: &str = "_v";
pub(crate) const CREATED_AT_FIELD: &str = "_createdAt";

/// Prefixes a field name for storage or filtering.
#[must_use]
pub(crate) fn prefixed(name: &str) -> String {
    format!("{TAG_PREFIX}{name}")
}

/// The RFC 3339 millisecond token `_createdAt` is stored as.
pub(crate) fn timestamp_token(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Iterates the document fields of an entry's tags, prefix stripped.
pub(crate) fn document_tags(record: &TransactionRecord) -> impl Iterator<Item = (&str, &str)> {
    record
        .tags
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|tag| tag.name.strip_prefix(TAG_PREFIX).map(|name| (name, tag.value.as_str())))
}

/// Encodes one document version as a new ledger entry.
///
/// Indexed fields and the metadata become prefixed tags; non-indexed fields
/// become the JSON payload.
pub(crate) fn encode_entry(
    schema: &DocumentSchema,
    id: &str,
    version: u64,
    created_at: DateTime<Utc>,
    fields: &Fields,
) -> NewEntry {
    let mut tags = vec![
        Tag::new(prefixed(ID_FIELD), id),
        Tag::new(prefixed(VERSION_FIELD), version.to_string()),
        Tag::new(prefixed(CREATED_AT_FIELD), timestamp_token(created_at)),
    ];

    let mut payload_fields = Fields::new();
    for (name, value) in fields {
        let indexed = schema.descriptor(name).is_none_or(|descriptor| descriptor.indexed);
        if indexed {
            tags.push(Tag::new(prefixed(name), value.render()));
        } else {
            payload_fields.insert(name.clone(), value.clone());
        }
    }

    let payload = if payload_fields.is_empty() {
        filler()
    } else {
        // Validation rejects non-finite numbers, so serialization cannot
        // fail on the values that reach this point.
        serde_json::to_string(&payload_fields).unwrap_or_else(|_| filler())
    };

    NewEntry { tags, payload }
}

/// Four random digits, standing in for an empty payload.
fn filler() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}

/// Field predicates for filter-based document lookups.
///
/// Clauses are ANDed together; the values of one clause are ORed, mirroring
/// how the gateway combines tag filters.
///
/// # Example
///
/// ```
/// use tessera_gateway_sdk::schema::DocumentFilter;
///
/// let filter = DocumentFilter::new()
///     .field("wing", "red")
///     .field_in("age", [98_i64, 100]);
/// assert!(!filter.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    clauses: Vec<(String, Vec<FieldValue>)>,
}

impl DocumentFilter {
    /// An empty filter. Matches every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `name` to equal `value`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.clauses.push((name.into(), vec![value.into()]));
        self
    }

    /// Requires `name` to equal any of `values`.
    #[must_use]
    pub fn field_in<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.clauses.push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// True when no clause has been added. An empty filter matches every
    /// document of the collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The prefixed tag filters this filter queries with.
    #[must_use]
    pub(crate) fn to_tag_filters(&self) -> Vec<TagFilter> {
        self.clauses
            .iter()
            .map(|(name, values)| TagFilter {
                name: prefixed(name),
                values: values.iter().map(FieldValue::render).collect(),
            })
            .collect()
    }
}
