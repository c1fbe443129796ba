//! Request Cache replay tool
//!
//! Runs each command-line argument as a JSON request through a cached
//! executor backed by a demo resolver, then prints the cache statistics.
//!
//! ```text
//! request_cache '{"id":"1"}' '{"id":"2"}' '{"id":"1"}'
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_cache::{CacheConfig, RequestExecutor};

/// Main entry point for the replay tool.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Parse every argument as a JSON request
/// 4. Execute the requests in order, printing each result
/// 5. Print the final cache statistics as JSON
#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CacheConfig::from_env();
    let latency = Duration::from_millis(
        env::var("REQUEST_CACHE_DEMO_LATENCY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50),
    );
    info!(
        "Configuration loaded: capacity={}, ttl={}ms, demo_latency={}ms",
        config.capacity,
        config.ttl_ms(),
        latency.as_millis()
    );

    let requests = env::args()
        .skip(1)
        .map(|arg| {
            serde_json::from_str::<Value>(&arg)
                .with_context(|| format!("request is not valid JSON: {arg}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let executor = RequestExecutor::builder(move |request: Value| async move {
        tokio::time::sleep(latency).await;
        if request.get("fail") == Some(&Value::Bool(true)) {
            return Err(format!("request asked to fail: {request}"));
        }
        Ok(json!({ "resolved": request }))
    })
    .config(config)
    .on_cache_hit(|key| info!(%key, "cache hit"))
    .on_cache_miss(|key| info!(%key, "cache miss"))
    .build();

    for request in requests {
        match executor.execute_promise(request).await {
            Ok(value) => println!("{value}"),
            Err(err) => warn!(%err, "request failed"),
        }
    }

    let stats = executor.get_cache_stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    info!("hit rate {:.2}", stats.hit_rate());

    Ok(())
}
