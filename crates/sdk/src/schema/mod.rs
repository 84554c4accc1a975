//! Schema-backed document storage over ledger entries.
//!
//! A [`Collection`] maps a logical document type onto plain entries. Every
//! field of a document is stored as a prefixed tag (or, for non-indexed
//! fields, in the entry payload), so documents remain ordinary entries that
//! any client can query. Documents are never mutated: an update posts a new
//! entry with a bumped version counter, and reads resolve the highest
//! version for an id. See [`codec`] for the exact tag layout.
//!
//! # Example
//!
//! ```no_run
//! use tessera_gateway_sdk::schema::{
//!     DocumentFilter, DocumentSchema, FieldKind, Fields, SchemaRegistry,
//! };
//!
//! # async fn demo() -> tessera_gateway_sdk::Result<()> {
//! let registry = SchemaRegistry::connect("https://gateway.tessera.dev")?;
//! let pilots = registry.define(
//!     "pilots",
//!     DocumentSchema::new()
//!         .field("missions", FieldKind::Number)
//!         .field("callsign", FieldKind::String)
//!         .field("wing", FieldKind::String),
//! );
//!
//! let created = pilots
//!     .create(Fields::from([
//!         ("missions".to_owned(), 100.into()),
//!         ("callsign".to_owned(), "maverick".into()),
//!         ("wing".to_owned(), "red".into()),
//!     ]))
//!     .await?;
//!
//! let filter = DocumentFilter::new().field("wing", "red");
//! let found = pilots.find_one(&filter).await?;
//! assert_eq!(found.map(|doc| doc.id), Some(created.id));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use snafu::ResultExt;
use tracing::debug;
use uuid::Uuid;

use crate::client::GatewayClient;
use crate::config::GatewayConfig;
use crate::error::{DecodeSnafu, InvalidStateSnafu, Result};
use crate::gateway::{HttpGateway, WriteGateway};

pub mod codec;
pub mod descriptor;
pub mod document;

pub use codec::{DocumentFilter, TAG_PREFIX};
pub use descriptor::{DocumentSchema, FieldDescriptor, FieldKind};
pub use document::{Document, FieldValue, Fields};

// ============================================================================
// Collection
// ============================================================================

/// Handle to one logical document type.
///
/// Cheap to clone; clones share the schema and the underlying transports.
#[derive(Clone)]
pub struct Collection {
    name: String,
    schema: Arc<DocumentSchema>,
    client: GatewayClient,
    writer: Arc<dyn WriteGateway>,
}

impl Collection {
    /// Binds a document type to its schema and transports.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        schema: DocumentSchema,
        client: GatewayClient,
        writer: Arc<dyn WriteGateway>,
    ) -> Self {
        Self { name: name.into(), schema: Arc::new(schema), client, writer }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema documents are validated against.
    #[must_use]
    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    /// Creates a new document, assigning it a fresh id.
    ///
    /// The returned document is version 1 with its payload fields loaded;
    /// [`mined_at`](Document::mined_at) stays `None` until the carrying
    /// entry lands in a block.
    ///
    /// # Errors
    ///
    /// Invalid fields surface as
    /// [`SdkError::Validation`](crate::error::SdkError::Validation) before
    /// anything is written. Write failures propagate; they are never
    /// softened to empty results the way read failures are.
    pub async fn create(&self, fields: Fields) -> Result<Document> {
        self.schema.validate(&fields)?;

        // Check-then-write, so concurrent creators can still collide on an
        // id. Single-writer use is assumed.
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if self.find_by_id(&candidate).await?.is_none() {
                break candidate;
            }
        };

        self.append_version(&id, 1, fields).await
    }

    /// Fetches the newest version of the document with the given id.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let found = self
            .client
            .transactions()
            .tag(codec::prefixed(codec::ID_FIELD), [id])
            .find_one()
            .await?;
        Ok(found.and_then(|view| Document::decode(view.record(), &self.schema)))
    }

    /// Fetches the first document matching `filter` that is still current.
    ///
    /// A match whose version has been superseded since it was written reads
    /// as `None`, not as the older data.
    pub async fn find_one(&self, filter: &DocumentFilter) -> Result<Option<Document>> {
        let found =
            self.client.transactions().tags(filter.to_tag_filters()).find_one().await?;
        let Some(candidate) = found.and_then(|view| Document::decode(view.record(), &self.schema))
        else {
            return Ok(None);
        };
        self.keep_if_current(candidate).await
    }

    /// Fetches every current document matching `filter`, newest first.
    ///
    /// Superseded versions also match the filter's tags; they are resolved
    /// per id and dropped.
    pub async fn find_many(&self, filter: &DocumentFilter) -> Result<Vec<Document>> {
        let found = self.client.transactions().tags(filter.to_tag_filters()).find_all().await?;

        let mut documents = Vec::new();
        for view in &found {
            let Some(candidate) = Document::decode(view.record(), &self.schema) else {
                continue;
            };
            if let Some(document) = self.keep_if_current(candidate).await? {
                documents.push(document);
            }
        }
        Ok(documents)
    }

    /// Fetches every stored version of a document, highest version first.
    pub async fn history(&self, id: &str) -> Result<Vec<Document>> {
        let found = self
            .client
            .transactions()
            .tag(codec::prefixed(codec::ID_FIELD), [id])
            .find_all()
            .await?;

        let mut versions: Vec<Document> = found
            .iter()
            .filter_map(|view| Document::decode(view.record(), &self.schema))
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    /// Replaces the document with the given id by a new version.
    ///
    /// `fields` becomes the complete field set of the new version; fields
    /// of the previous version are not carried over. Returns `None` when no
    /// document with that id exists.
    ///
    /// # Errors
    ///
    /// Same surface as [`create`](Self::create).
    pub async fn update_by_id(&self, id: &str, fields: Fields) -> Result<Option<Document>> {
        self.schema.validate(&fields)?;
        let Some(current) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.append_version(id, current.version + 1, fields).await?))
    }

    /// Replaces the first current document matching `filter`.
    ///
    /// Returns `None`, writing nothing, when the filter matches nothing
    /// current.
    pub async fn update_one(
        &self,
        filter: &DocumentFilter,
        fields: Fields,
    ) -> Result<Option<Document>> {
        self.schema.validate(&fields)?;
        let Some(current) = self.find_one(filter).await? else {
            return Ok(None);
        };
        Ok(Some(self.append_version(&current.id, current.version + 1, fields).await?))
    }

    /// Replaces every current document matching `filter`, one entry per
    /// match, all with the same `fields`.
    pub async fn update_many(
        &self,
        filter: &DocumentFilter,
        fields: Fields,
    ) -> Result<Vec<Document>> {
        self.schema.validate(&fields)?;
        let matches = self.find_many(filter).await?;

        let mut updated = Vec::with_capacity(matches.len());
        for current in matches {
            updated
                .push(self.append_version(&current.id, current.version + 1, fields.clone()).await?);
        }
        Ok(updated)
    }

    /// Loads the non-indexed fields of a document in place.
    ///
    /// Does nothing when the payload is already loaded, which includes
    /// every document of a fully indexed schema.
    ///
    /// # Errors
    ///
    /// Needs the carrying entry id; a document synthesized without one
    /// fails with [`SdkError::InvalidState`](crate::error::SdkError::InvalidState).
    /// A payload that is not a JSON field map fails with
    /// [`SdkError::Decode`](crate::error::SdkError::Decode).
    pub async fn get_data(&self, document: &mut Document) -> Result<()> {
        if document.payload_loaded {
            return Ok(());
        }
        let Some(entry_id) = document.entry_id.clone() else {
            return InvalidStateSnafu { message: "payload expansion requires the carrying entry id" }
                .fail();
        };

        let payload = self.client.fetch_payload(&entry_id).await?;
        let decoded: Fields =
            serde_json::from_str(&payload).context(DecodeSnafu { what: "document payload" })?;
        document.merge_payload(decoded);
        Ok(())
    }

    /// Posts one document version and returns its decoded form.
    async fn append_version(&self, id: &str, version: u64, fields: Fields) -> Result<Document> {
        let created_at = Utc::now();
        let entry = codec::encode_entry(&self.schema, id, version, created_at, &fields);
        let entry_id = self.writer.post_entry(&entry).await?;
        debug!(collection = %self.name, id, version, "appended document version");

        Ok(Document {
            id: id.to_owned(),
            version,
            created_at,
            mined_at: None,
            entry_id: Some(entry_id),
            fields,
            payload_loaded: true,
        })
    }

    /// Discards a candidate version that is no longer the newest for its id.
    async fn keep_if_current(&self, candidate: Document) -> Result<Option<Document>> {
        match self.find_by_id(&candidate.id).await? {
            Some(current) if current.version == candidate.version => Ok(Some(candidate)),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("fields", &self.schema.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SchemaRegistry
// ============================================================================

/// Named set of collections sharing one pair of transports.
pub struct SchemaRegistry {
    client: GatewayClient,
    writer: Arc<dyn WriteGateway>,
    collections: RwLock<HashMap<String, Collection>>,
}

impl SchemaRegistry {
    /// Creates a registry over explicit transports.
    #[must_use]
    pub fn new(client: GatewayClient, writer: Arc<dyn WriteGateway>) -> Self {
        Self { client, writer, collections: RwLock::new(HashMap::new()) }
    }

    /// Creates a registry talking to a gateway endpoint with default
    /// settings.
    ///
    /// # Errors
    ///
    /// Fails when the endpoint is not a valid HTTP(S) URL.
    pub fn connect(endpoint: impl Into<String>) -> Result<Self> {
        let config = GatewayConfig::builder().with_endpoint(endpoint).build()?;
        let gateway = Arc::new(HttpGateway::new(config)?);
        let client = GatewayClient::with_reader(Arc::clone(&gateway) as _);
        Ok(Self::new(client, gateway))
    }

    /// Defines (or redefines) a collection and returns a handle to it.
    pub fn define(&self, name: impl Into<String>, schema: DocumentSchema) -> Collection {
        let name = name.into();
        debug!(collection = %name, "defining collection");
        let collection =
            Collection::new(name.clone(), schema, self.client.clone(), Arc::clone(&self.writer));
        self.collections.write().insert(name, collection.clone());
        collection
    }

    /// Looks up a previously defined collection.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Collection> {
        self.collections.read().get(name).cloned()
    }

    /// The defined collection names, sorted.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("collections", &self.collection_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::SdkError;
    use crate::mock::MockGateway;

    fn harness() -> (MockGateway, SchemaRegistry) {
        let mock = MockGateway::new();
        let client = GatewayClient::with_reader(Arc::new(mock.clone()));
        let registry = SchemaRegistry::new(client, Arc::new(mock.clone()));
        (mock, registry)
    }

    fn pilot_schema() -> DocumentSchema {
        DocumentSchema::new()
            .field("missions", FieldKind::Number)
            .field("callsign", FieldKind::String)
            .field("wing", FieldKind::String)
            .field(
                "mentor",
                FieldDescriptor::builder().kind(FieldKind::String).required(false).build(),
            )
    }

    fn pilot_collection() -> (MockGateway, Collection) {
        let (mock, registry) = harness();
        let collection = registry.define("pilots", pilot_schema());
        (mock, collection)
    }

    fn pilot(missions: i64, callsign: &str, wing: &str) -> Fields {
        Fields::from([
            ("missions".to_owned(), missions.into()),
            ("callsign".to_owned(), callsign.into()),
            ("wing".to_owned(), wing.into()),
        ])
    }

    fn with_mentor(mut fields: Fields, mentor: &str) -> Fields {
        fields.insert("mentor".to_owned(), mentor.into());
        fields
    }

    #[tokio::test]
    async fn test_create_then_find_by_id() {
        let (mock, pilots) = pilot_collection();

        let created = pilots.create(pilot(100, "maverick", "red")).await.unwrap();
        assert_eq!(created.version, 1);
        assert!(created.payload_loaded());
        assert!(created.mined_at.is_none());
        assert_eq!(mock.post_count(), 1);

        let found = pilots.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.version, 1);
        assert_eq!(found.number_field("missions"), Some(100.0));
        assert_eq!(found.str_field("callsign"), Some("maverick"));
        assert_eq!(found.created_at.timestamp_millis(), created.created_at.timestamp_millis());
        assert_eq!(found.entry_id, created.entry_id);
        assert!(found.mined_at.is_some());
    }

    #[tokio::test]
    async fn test_updates_append_versions_and_replace_fields() {
        let (_mock, pilots) = pilot_collection();

        let created = pilots.create(pilot(100, "maverick", "red")).await.unwrap();

        let v2 = pilots
            .update_by_id(&created.id, with_mentor(pilot(101, "maverick", "red"), "viper"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v2.str_field("mentor"), Some("viper"));

        let v3 = pilots.update_by_id(&created.id, pilot(102, "maverick", "gold")).await;
        let v3 = v3.unwrap().unwrap();
        assert_eq!(v3.version, 3);
        // Full replacement, so the optional field from v2 does not carry over.
        assert!(v3.field("mentor").is_none());

        let newest = pilots.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(newest.version, 3);
        assert_eq!(newest.str_field("wing"), Some("gold"));
        assert!(newest.field("mentor").is_none());
    }

    #[tokio::test]
    async fn test_history_lists_versions_newest_first() {
        let (_mock, pilots) = pilot_collection();

        let created = pilots.create(pilot(1, "echo", "blue")).await.unwrap();
        pilots.update_by_id(&created.id, pilot(2, "echo", "blue")).await.unwrap();
        pilots.update_by_id(&created.id, pilot(3, "echo", "blue")).await.unwrap();

        let history = pilots.history(&created.id).await.unwrap();
        let versions: Vec<u64> = history.iter().map(|doc| doc.version).collect();
        assert_eq!(versions, vec![3, 2, 1]);
        assert_eq!(history[2].number_field("missions"), Some(1.0));
    }

    #[tokio::test]
    async fn test_update_of_an_unknown_id_is_none() {
        let (mock, pilots) = pilot_collection();

        let updated = pilots.update_by_id("ghost", pilot(1, "echo", "blue")).await.unwrap();
        assert!(updated.is_none());
        assert_eq!(mock.post_count(), 0);
    }

    #[tokio::test]
    async fn test_find_one_skips_superseded_versions() {
        let (_mock, pilots) = pilot_collection();

        let created = pilots.create(pilot(100, "maverick", "red")).await.unwrap();
        pilots.update_by_id(&created.id, pilot(98, "maverick", "red")).await.unwrap();

        let stale = DocumentFilter::new().field("missions", 100_i64);
        assert!(pilots.find_one(&stale).await.unwrap().is_none());

        let current = DocumentFilter::new().field("missions", 98_i64);
        let found = pilots.find_one(&current).await.unwrap().unwrap();
        assert_eq!(found.version, 2);
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_update_one_writes_nothing_for_stale_matches() {
        let (mock, pilots) = pilot_collection();

        let created = pilots.create(pilot(100, "maverick", "red")).await.unwrap();
        pilots.update_by_id(&created.id, pilot(98, "maverick", "red")).await.unwrap();
        let posts = mock.post_count();

        let stale = DocumentFilter::new().field("missions", 100_i64);
        let updated = pilots.update_one(&stale, pilot(1, "maverick", "red")).await.unwrap();
        assert!(updated.is_none());
        assert_eq!(mock.post_count(), posts);

        let current = DocumentFilter::new().field("missions", 98_i64);
        let updated = pilots.update_one(&current, pilot(1, "maverick", "red")).await.unwrap();
        assert_eq!(updated.unwrap().version, 3);
    }

    #[tokio::test]
    async fn test_find_many_returns_current_versions_newest_first() {
        let (_mock, pilots) = pilot_collection();

        pilots.create(pilot(10, "echo", "red")).await.unwrap();
        let goose = pilots.create(pilot(20, "goose", "red")).await.unwrap();

        let reds = DocumentFilter::new().field("wing", "red");
        let found = pilots.find_many(&reds).await.unwrap();
        let callsigns: Vec<_> = found.iter().filter_map(|doc| doc.str_field("callsign")).collect();
        assert_eq!(callsigns, vec!["goose", "echo"]);

        pilots.update_by_id(&goose.id, pilot(21, "goose", "gold")).await.unwrap();

        let found = pilots.find_many(&reds).await.unwrap();
        let callsigns: Vec<_> = found.iter().filter_map(|doc| doc.str_field("callsign")).collect();
        assert_eq!(callsigns, vec!["echo"]);

        // An empty filter matches everything still current.
        assert_eq!(pilots.find_many(&DocumentFilter::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_payload_fields_round_trip_through_get_data() {
        let (mock, registry) = harness();
        let notes = registry.define(
            "notes",
            DocumentSchema::new().field("title", FieldKind::String).field(
                "body",
                FieldDescriptor::builder().kind(FieldKind::String).indexed(false).build(),
            ),
        );

        let created = notes
            .create(Fields::from([
                ("title".to_owned(), "briefing".into()),
                ("body".to_owned(), "meet at dawn".into()),
            ]))
            .await
            .unwrap();
        assert!(created.payload_loaded());

        let mut found = notes.find_by_id(&created.id).await.unwrap().unwrap();
        assert!(!found.payload_loaded());
        assert_eq!(found.str_field("title"), Some("briefing"));
        assert!(found.field("body").is_none());

        notes.get_data(&mut found).await.unwrap();
        assert!(found.payload_loaded());
        assert_eq!(found.str_field("body"), Some("meet at dawn"));
        assert_eq!(mock.payload_count(), 1);

        notes.get_data(&mut found).await.unwrap();
        assert_eq!(mock.payload_count(), 1);
    }

    #[tokio::test]
    async fn test_get_data_skips_fully_indexed_documents() {
        let (mock, pilots) = pilot_collection();

        let created = pilots.create(pilot(1, "echo", "blue")).await.unwrap();
        let mut found = pilots.find_by_id(&created.id).await.unwrap().unwrap();

        pilots.get_data(&mut found).await.unwrap();
        assert_eq!(mock.payload_count(), 0);
    }

    #[tokio::test]
    async fn test_create_validates_before_posting() {
        let (mock, pilots) = pilot_collection();

        let mut missing = pilot(1, "echo", "blue");
        missing.remove("wing");
        let outcome = pilots.create(missing).await;
        assert!(matches!(outcome, Err(SdkError::Validation { field, .. }) if field == "wing"));

        let mut wrong_kind = pilot(1, "echo", "blue");
        wrong_kind.insert("missions".to_owned(), "lots".into());
        assert!(pilots.create(wrong_kind).await.is_err());

        let mut undeclared = pilot(1, "echo", "blue");
        undeclared.insert("rank".to_owned(), "captain".into());
        assert!(pilots.create(undeclared).await.is_err());

        assert_eq!(mock.post_count(), 0);
        assert_eq!(mock.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_write_failures_are_hard_errors() {
        let (mock, pilots) = pilot_collection();
        mock.fail_writes(true);

        let err = pilots.create(pilot(1, "echo", "blue")).await.unwrap_err();
        assert!(matches!(err, SdkError::Gateway { status: 500, .. }));
    }

    #[test]
    fn test_registry_hands_out_defined_collections() {
        let (_mock, registry) = harness();
        registry.define("pilots", pilot_schema());
        registry.define("briefings", DocumentSchema::new().field("title", FieldKind::String));

        assert_eq!(registry.collection_names(), vec!["briefings", "pilots"]);
        assert!(registry.get("wings").is_none());

        let fields = registry.get("pilots").map(|collection| collection.schema().len());
        assert_eq!(fields, Some(4));
    }

    #[tokio::test]
    async fn test_update_many_updates_every_current_match() {
        let (_mock, pilots) = pilot_collection();

        for index in 0..120 {
            pilots.create(pilot(index, &format!("pilot-{index}"), "bulk")).await.unwrap();
        }

        let bulk = DocumentFilter::new().field("wing", "bulk");
        let updated = pilots.update_many(&bulk, pilot(1, "renamed", "bulk")).await.unwrap();
        assert_eq!(updated.len(), 120);
        assert!(updated.iter().all(|doc| doc.version == 2));

        let history = pilots.history(&updated[0].id).await.unwrap();
        let versions: Vec<u64> = history.iter().map(|doc| doc.version).collect();
        assert_eq!(versions, vec![2, 1]);
    }
}
