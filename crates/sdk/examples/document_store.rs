//! Document collections over a gateway.
//!
//! Run: `cargo run --example document_store -- --endpoint http://localhost:8080`
//!
//! This example shows:
//! - Defining a schema with required, optional, and non-indexed fields
//! - Creating versioned documents
//! - Filtered lookups that skip superseded versions
//! - Version history and payload recovery
//!
//! Writes go through `POST /entries`, so point it at a gateway you are
//! allowed to write to (a devnet or a local node).

// Examples are allowed to use expect/unwrap for brevity
#![allow(clippy::expect_used, clippy::unwrap_used)]

use tessera_gateway_sdk::Result;
use tessera_gateway_sdk::schema::{
    DocumentFilter, DocumentSchema, FieldDescriptor, FieldKind, Fields, SchemaRegistry,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let endpoint = args
        .iter()
        .position(|a| a == "--endpoint")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or("http://localhost:8080");

    println!("Using gateway at {endpoint}");

    // -------------------------------------------------------------------------
    // 1. Define a collection
    // -------------------------------------------------------------------------
    let registry = SchemaRegistry::connect(endpoint)?;
    let pilots = registry.define(
        "pilots",
        DocumentSchema::new()
            .field("missions", FieldKind::Number)
            .field("callsign", FieldKind::String)
            .field("wing", FieldKind::String)
            .field(
                "debrief",
                FieldDescriptor::builder().kind(FieldKind::String).indexed(false).build(),
            ),
    );

    // -------------------------------------------------------------------------
    // 2. Create a document
    // -------------------------------------------------------------------------
    let created = pilots
        .create(Fields::from([
            ("missions".to_owned(), 12.into()),
            ("callsign".to_owned(), "echo".into()),
            ("wing".to_owned(), "red".into()),
            ("debrief".to_owned(), "uneventful patrol".into()),
        ]))
        .await?;
    println!("Created {} v{}", created.id, created.version);

    // -------------------------------------------------------------------------
    // 3. Update it: a new version, fields fully replaced
    // -------------------------------------------------------------------------
    let updated = pilots
        .update_by_id(
            &created.id,
            Fields::from([
                ("missions".to_owned(), 13.into()),
                ("callsign".to_owned(), "echo".into()),
                ("wing".to_owned(), "gold".into()),
                ("debrief".to_owned(), "wing reassignment".into()),
            ]),
        )
        .await?
        .expect("document vanished");
    println!("Updated to v{}", updated.version);

    // -------------------------------------------------------------------------
    // 4. Filtered lookups resolve to the current version only
    // -------------------------------------------------------------------------
    let golds = pilots.find_many(&DocumentFilter::new().field("wing", "gold")).await?;
    println!("Gold wing: {} documents", golds.len());

    // -------------------------------------------------------------------------
    // 5. History and payload recovery
    // -------------------------------------------------------------------------
    for version in pilots.history(&created.id).await? {
        println!("  v{} created {}", version.version, version.created_at);
    }

    if let Some(mut newest) = pilots.find_by_id(&created.id).await? {
        pilots.get_data(&mut newest).await?;
        println!("Debrief: {:?}", newest.str_field("debrief"));
    }

    Ok(())
}
