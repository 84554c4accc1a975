//! Basic usage example demonstrating search and pagination.
//!
//! Run: `cargo run --example basic_usage -- --endpoint https://gateway.tessera.dev`
//!
//! This example shows:
//! - Client configuration and connection
//! - Tag-filtered transaction searches
//! - Cursor pagination with `find` and `next`
//! - Block queries bounded by height
//! - Single-record lookups and payload retrieval

// Examples are allowed to use expect/unwrap for brevity
#![allow(clippy::expect_used, clippy::unwrap_used)]

use tessera_gateway_sdk::{GatewayClient, GatewayConfig, Result, SortOrder};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let endpoint = args
        .iter()
        .position(|a| a == "--endpoint")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or("https://gateway.tessera.dev");

    println!("Connecting to gateway at {endpoint}");

    // -------------------------------------------------------------------------
    // 1. Create a client with configuration
    // -------------------------------------------------------------------------
    let config = GatewayConfig::builder()
        .with_endpoint(endpoint)
        .with_timeout(std::time::Duration::from_secs(10))
        .build()?;
    let client = GatewayClient::new(config)?;

    // -------------------------------------------------------------------------
    // 2. Search the newest entries of an app
    // -------------------------------------------------------------------------
    let mut search = client
        .transactions()
        .app_name("tessera-notes")
        .sort(SortOrder::HeightDescending)
        .limit(5);

    let first_page = search.find().await?;
    println!("First page: {} entries", first_page.len());
    for entry in &first_page {
        println!("  {:?} in block {:?}", entry.id(), entry.block().and_then(|b| b.height));
    }

    // -------------------------------------------------------------------------
    // 3. Continue from the stored cursor
    // -------------------------------------------------------------------------
    let second_page = search.next().await?;
    println!("Second page: {} entries", second_page.len());

    // -------------------------------------------------------------------------
    // 4. Blocks in a height window, oldest first
    // -------------------------------------------------------------------------
    let blocks = client
        .blocks()
        .min_height(1)
        .max_height(50)
        .sort(SortOrder::HeightAscending)
        .limit(10)
        .find()
        .await?;
    println!("Blocks in window: {}", blocks.len());

    // -------------------------------------------------------------------------
    // 5. Fetch one entry and its payload
    // -------------------------------------------------------------------------
    if let Some(id) = first_page.first().and_then(|entry| entry.id()) {
        let entry = client.transaction(id).find_one().await?;
        println!("Lookup {id}: found = {}", entry.is_some());

        match client.fetch_payload(id).await {
            Ok(payload) => println!("Payload is {} bytes", payload.len()),
            Err(err) => println!("Payload unavailable: {err}"),
        }
    }

    Ok(())
}
