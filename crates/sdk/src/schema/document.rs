//! Decoded document versions and their field values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_gateway_types::TransactionRecord;
use tracing::warn;

use crate::schema::codec;
use crate::schema::descriptor::{DocumentSchema, FieldKind};

/// A schema field value.
///
/// Serializes untagged, so a payload object reads as plain JSON:
/// `{"active":true,"bio":"...","score":12.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A text value.
    Str(String),
    /// A numeric value. Finite only; validation rejects NaN and infinities.
    Number(f64),
    /// A boolean value.
    Bool(bool),
}

/// Field map of one document version, keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// The text value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The numeric value, if this is a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The boolean value, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The string form stored in a tag. Whole numbers drop the fraction, so
    /// a filter built from the same value matches byte for byte.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Number(value) => render_number(*value),
            Self::Bool(value) => value.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One version of a logical document, decoded from a ledger entry.
///
/// Documents are never mutated in place. Every update appends a fresh entry
/// with a bumped [`version`](Self::version), and reads resolve the highest
/// version for an id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Logical id shared by every version of the document.
    pub id: String,
    /// Version counter; 1 is the created version.
    pub version: u64,
    /// Creation time stamped by the writing client.
    pub created_at: DateTime<Utc>,
    /// Block time of the carrying entry, once mined.
    pub mined_at: Option<DateTime<Utc>>,
    /// Ledger entry carrying this version.
    pub entry_id: Option<String>,
    /// Decoded fields. Non-indexed fields appear only after
    /// [`get_data`](crate::schema::Collection::get_data).
    pub fields: Fields,
    pub(crate) payload_loaded: bool,
}

impl Document {
    /// Looks up a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Shorthand for a string field.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    /// Shorthand for a numeric field.
    #[must_use]
    pub fn number_field(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(FieldValue::as_number)
    }

    /// Shorthand for a boolean field.
    #[must_use]
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(FieldValue::as_bool)
    }

    /// True when the non-indexed payload has been merged, or the schema has
    /// no non-indexed fields to begin with.
    #[must_use]
    pub fn payload_loaded(&self) -> bool {
        self.payload_loaded
    }

    /// Decodes a document version from an entry's tags.
    ///
    /// Entries without the document metadata tags (id, version, creation
    /// time) are not documents of this store and decode to `None`. Declared
    /// number and boolean fields are parsed back from their tag form; a
    /// value that does not parse stays a string and logs a warning.
    #[must_use]
    pub fn decode(record: &TransactionRecord, schema: &DocumentSchema) -> Option<Self> {
        let mut raw: BTreeMap<&str, &str> = codec::document_tags(record).collect();

        let id = raw.remove(codec::ID_FIELD)?.to_owned();
        let version = match raw.remove(codec::VERSION_FIELD)?.parse::<u64>() {
            Ok(version) => version,
            Err(_) => {
                warn!(id, "entry carries an unparseable version tag, skipping");
                return None;
            },
        };
        let created_at = match DateTime::parse_from_rfc3339(raw.remove(codec::CREATED_AT_FIELD)?) {
            Ok(parsed) => parsed.with_timezone(&Utc),
            Err(_) => {
                warn!(id, "entry carries an unparseable creation time, skipping");
                return None;
            },
        };

        let fields = raw
            .into_iter()
            .map(|(name, value)| (name.to_owned(), coerce(schema, name, value)))
            .collect();

        let mined_at = record
            .block
            .as_ref()
            .and_then(|block| block.timestamp)
            .and_then(|seconds| DateTime::from_timestamp(seconds as i64, 0));

        Some(Self {
            id,
            version,
            created_at,
            mined_at,
            entry_id: record.id.clone(),
            fields,
            payload_loaded: schema.is_fully_indexed(),
        })
    }

    /// Merges payload-recovered fields in; tag-decoded values win.
    pub(crate) fn merge_payload(&mut self, mut decoded: Fields) {
        decoded.append(&mut self.fields);
        std::mem::swap(&mut self.fields, &mut decoded);
        self.payload_loaded = true;
    }
}

/// Parses a tag value back into its declared kind, keeping the string form
/// when it does not parse or the field was never declared.
fn coerce(schema: &DocumentSchema, name: &str, value: &str) -> FieldValue {
    match schema.descriptor(name).map(|descriptor| descriptor.kind) {
        Some(FieldKind::Number) => match value.parse::<f64>() {
            Ok(number) => FieldValue::Number(number),
            Err(_) => {
                warn!(field = name, "declared number does not parse, keeping the string");
                FieldValue::Str(value.to_owned())
            },
        },
        Some(FieldKind::Boolean) => match value {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => {
                warn!(field = name, "declared boolean does not parse, keeping the string");
                FieldValue::Str(value.to_owned())
            },
        },
        Some(FieldKind::String) | None => FieldValue::Str(value.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tessera_gateway_types::{BlockRecord, Tag};

    use super::*;
    use crate::schema::descriptor::FieldDescriptor;

    fn schema() -> DocumentSchema {
        DocumentSchema::new()
            .field("age", FieldKind::Number)
            .field("name", FieldKind::String)
            .field("active", FieldKind::Boolean)
    }

    fn record(tags: Vec<Tag>) -> TransactionRecord {
        TransactionRecord {
            id: Some("entry-1".to_owned()),
            tags: Some(tags),
            block: Some(BlockRecord {
                id: Some("block-7".to_owned()),
                timestamp: Some(1_600_000_840),
                height: Some(7),
                previous: None,
            }),
            ..TransactionRecord::default()
        }
    }

    fn document_record() -> TransactionRecord {
        record(vec![
            Tag::new("__%$_id", "doc-1"),
            Tag::new("__%$_v", "3"),
            Tag::new("__%$_createdAt", "2026-08-25T09:30:00.000Z"),
            Tag::new("__%$age", "100"),
            Tag::new("__%$name", "nova"),
            Tag::new("__%$active", "true"),
            Tag::new("App-Name", "unrelated"),
        ])
    }

    #[test]
    fn test_decode_reads_metadata_and_coerces_fields() {
        let doc = Document::decode(&document_record(), &schema()).unwrap();

        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.version, 3);
        assert_eq!(doc.created_at.to_rfc3339(), "2026-08-25T09:30:00+00:00");
        assert_eq!(doc.entry_id.as_deref(), Some("entry-1"));
        assert_eq!(doc.mined_at.unwrap().timestamp(), 1_600_000_840);

        assert_eq!(doc.number_field("age"), Some(100.0));
        assert_eq!(doc.str_field("name"), Some("nova"));
        assert_eq!(doc.bool_field("active"), Some(true));
        assert!(doc.field("App-Name").is_none());
        assert!(doc.payload_loaded());
    }

    #[test]
    fn test_entry_without_document_tags_is_not_a_document() {
        let foreign = record(vec![Tag::new("Content-Type", "text/plain")]);
        assert!(Document::decode(&foreign, &schema()).is_none());
    }

    #[test]
    fn test_unparseable_number_stays_a_string() {
        let rec = record(vec![
            Tag::new("__%$_id", "doc-2"),
            Tag::new("__%$_v", "1"),
            Tag::new("__%$_createdAt", "2026-08-25T09:30:00.000Z"),
            Tag::new("__%$age", "a hundred"),
        ]);

        let doc = Document::decode(&rec, &schema()).unwrap();
        assert_eq!(doc.str_field("age"), Some("a hundred"));
        assert_eq!(doc.number_field("age"), None);
    }

    #[test]
    fn test_unmined_entry_has_no_mined_at() {
        let mut rec = document_record();
        rec.block = None;

        let doc = Document::decode(&rec, &schema()).unwrap();
        assert!(doc.mined_at.is_none());
    }

    #[test]
    fn test_partial_schema_leaves_payload_unloaded() {
        let with_payload = schema().field(
            "bio",
            FieldDescriptor::builder().kind(FieldKind::String).indexed(false).build(),
        );

        let mut doc = Document::decode(&document_record(), &with_payload).unwrap();
        assert!(!doc.payload_loaded());

        doc.merge_payload(Fields::from([("bio".to_owned(), "a pilot".into())]));
        assert!(doc.payload_loaded());
        assert_eq!(doc.str_field("bio"), Some("a pilot"));
        assert_eq!(doc.number_field("age"), Some(100.0));
    }

    #[test]
    fn test_merge_keeps_tag_values_on_collision() {
        let mut doc = Document::decode(&document_record(), &schema()).unwrap();
        doc.merge_payload(Fields::from([("name".to_owned(), "shadowed".into())]));

        assert_eq!(doc.str_field("name"), Some("nova"));
    }

    #[test]
    fn test_render_forms() {
        assert_eq!(FieldValue::from("nova").render(), "nova");
        assert_eq!(FieldValue::from(100_i64).render(), "100");
        assert_eq!(FieldValue::from(12.5).render(), "12.5");
        assert_eq!(FieldValue::from(true).render(), "true");
    }

    #[test]
    fn test_field_values_serialize_untagged() {
        let fields = Fields::from([
            ("active".to_owned(), true.into()),
            ("age".to_owned(), 100.into()),
            ("name".to_owned(), "nova".into()),
        ]);

        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"active":true,"age":100.0,"name":"nova"}"#);

        let back: Fields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }
}
