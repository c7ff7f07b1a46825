//! Basic usage example for athena
//!
//! Run with: cargo run --example basic -p athena
//!
//! Set ATHENA_URL and ATHENA_API_KEY in .env file or environment variables:
//! ATHENA_URL=https://athena-db.com
//! ATHENA_API_KEY=...

use athena::monitor::{InstrumentedTransport, LastCallMonitor, LoggingMonitor, MonitorConfig};
use athena::{
    AthenaClient, AthenaError, CallOptions, CountMode, HttpTransport, HttpTransportConfig,
};
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), AthenaError> {
    // Load .env file
    dotenvy::dotenv().ok();

    let url = env::var("ATHENA_URL").unwrap_or_else(|_| athena::DEFAULT_BASE_URL.to_string());
    let api_key = env::var("ATHENA_API_KEY")
        .map_err(|_| AthenaError::Other("ATHENA_API_KEY must be set in .env or environment".into()))?;

    // Log every call to stderr and keep the last one around for inspection.
    let last = Arc::new(LastCallMonitor::new());
    let transport = InstrumentedTransport::new(HttpTransport::new(
        HttpTransportConfig::new()
            .base_url(&url)
            .timeout(Duration::from_secs(30)),
    )?)
    .with_config(
        MonitorConfig::new()
            .with_slow_call_threshold(Duration::from_secs(2))
            .enable_monitoring(),
    )
    .with_monitor(LoggingMonitor::new())
    .add_monitor_arc(last.clone());

    let client = AthenaClient::with_transport(
        transport,
        CallOptions::new().base_url(&url).api_key(api_key),
    );

    // ============================================
    // Insert
    // ============================================
    println!("=== Insert ===");
    let created = client
        .from("countries")
        .insert(json!({ "id": 1, "name": "Mordor" }))?
        .select_with("id,name", CallOptions::new().count(CountMode::Exact))
        .await;
    println!("status={} data={:?} error={:?}", created.status, created.data, created.error);

    // ============================================
    // Fetch
    // ============================================
    println!("\n=== Fetch ===");
    let mut countries = client.from("countries");
    let page = countries.ilike("name", "%or%").range(0, 9).select("id,name").await;
    println!("status={} data={:?}", page.status, page.data);

    let one = countries.reset().eq("id", 1).single("*").await;
    println!("single: {:?}", one.data);

    // ============================================
    // Update
    // ============================================
    println!("\n=== Update ===");
    let updated = countries
        .update(json!({ "name": "Mordor (renamed)" }))?
        .returning("id,name")
        .await;
    println!("updated: {:?} error={:?}", updated.data, updated.error);

    // ============================================
    // Delete
    // ============================================
    println!("\n=== Delete ===");
    let deleted = countries.delete()?.await;
    println!("deleted: status={} error={:?}", deleted.status, deleted.error);

    if let Some(request) = last.last_request() {
        println!("\nlast request: {} {}", request.endpoint, request.payload);
    }

    Ok(())
}
