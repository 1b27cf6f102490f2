//! Thread-safe singleton demo.
//!
//! Two threads ask for the singleton at the same time, each with its own value. If
//! both print the same value the singleton was reused; two different values would
//! mean two instances were created.
//!
//! Run with: `cargo run --example singleton_threadsafe`
//! Add `RUST_LOG=creational=trace` to see the registry events.

use creational::get_instance;
use std::sync::{Arc, Barrier};
use std::thread;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The singleton; its `value` proves which caller built it.
struct Singleton {
    value: String,
}

impl Singleton {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

fn test_singleton(value: &'static str, start: Arc<Barrier>) {
    start.wait();
    let singleton = get_instance(|| Singleton::new(value));
    println!("{}", singleton.value);
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    println!(
        "If you see the same value, then singleton was reused (yay!)\n\
         If you see different values, then 2 singletons were created (booo!!)\n\n\
         RESULT:\n"
    );

    let start = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["FOO", "BAR"]
        .into_iter()
        .map(|value| {
            let start = start.clone();
            thread::spawn(move || test_singleton(value, start))
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("a singleton thread panicked");
        }
    }
}
