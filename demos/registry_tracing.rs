//! Registry tracing demo.
//!
//! Demonstrates:
//! - Isolated registries declared with `define_registry!`
//! - Trace callback output for every registry operation
//! - A failing factory that leaves nothing behind, followed by a successful retry
//! - `register` refusing to replace an existing instance
//!
//! Run with: `cargo run --example registry_tracing`

use creational::{define_registry, RegistryError};
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

define_registry!(services);
define_registry!(settings);

#[derive(Debug)]
struct Database {
    url: String,
}

#[derive(Debug, Clone)]
struct AppSettings {
    name: String,
    version: u32,
}

fn connect(url: &str, attempt: u32) -> Result<Database, String> {
    if attempt == 0 {
        Err(format!("{url} is not reachable yet"))
    } else {
        Ok(Database {
            url: url.to_string(),
        })
    }
}

fn main() -> Result<(), RegistryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    println!("=== creational: Registry Tracing ===\n");

    services::set_trace_callback(|event| println!("   [services] {event}"));
    settings::set_trace_callback(|event| println!("   [settings] {event}"));

    // -------------------------------------------------------------------------
    // 1. Eager registration in its own registry
    // -------------------------------------------------------------------------
    println!("1. Registering settings...");

    settings::register(AppSettings {
        name: "MyApp".to_string(),
        version: 1,
    })?;

    match settings::register(AppSettings {
        name: "Other".to_string(),
        version: 2,
    }) {
        Ok(_) => println!("   second registration stored (unexpected)"),
        Err(e) => println!("   Error (expected): {e}"),
    }

    // -------------------------------------------------------------------------
    // 2. Fallible construction with retry
    // -------------------------------------------------------------------------
    println!("\n2. Connecting the database...");

    let url = "postgres://localhost/app";
    for attempt in 0..2 {
        match services::try_get_instance(|| connect(url, attempt)) {
            Ok(db) => println!("   connected to {}", db.url),
            Err(e) => println!("   attempt {attempt} failed: {e}"),
        }
    }

    // -------------------------------------------------------------------------
    // 3. Lookups
    // -------------------------------------------------------------------------
    println!("\n3. Looking things up...");

    let db: Arc<Database> = services::get()?;
    let app: AppSettings = settings::get_cloned()?;
    println!("   {} v{} uses {}", app.name, app.version, db.url);
    println!(
        "   settings contains Database: {}",
        settings::contains::<Database>()
    );

    services::clear_trace_callback();
    settings::clear_trace_callback();

    println!("\n=== Example Complete ===");
    println!(
        "services holds {} instance(s), settings holds {}.",
        services::len(),
        settings::len()
    );

    Ok(())
}
