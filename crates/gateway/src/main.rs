mod api;
mod cli;
mod error_response;
mod runner_registry;
mod service;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use ws_domain::config::{Config, ConfigSeverity};

use crate::cli::{Cli, Command};
use crate::state::{AppState, DebugSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let config = Arc::new(Config::from_env());
            run_server(config).await
        }
        Some(Command::Migrate) => {
            init_tracing();
            let config = Config::from_env();
            // `Store::connect` runs pending migrations as part of opening
            // the pool (§6.5: "tables are created if missing on startup").
            ws_store::Store::connect(&config.db_url, config.app_secret_key.expose())
                .await
                .context("running migrations")?;
            println!("migrations applied");
            Ok(())
        }
        Some(Command::Doctor) => {
            let config = Config::from_env();
            let passed = cli::doctor::run(&config).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Version) => {
            println!("worldline-gateway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Structured JSON tracing (only for the `serve` command), mirroring the
/// teacher's `init_tracing` in `crates/gateway/src/main.rs`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ws_gateway=debug")),
        )
        .json()
        .init();
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("worldline gateway starting");

    // ── Config validation (§7 `ConfigError` -> fatal on startup) ──────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count()
        );
    }

    // ── Store (§4.1) ───────────────────────────────────────────────────
    let store = ws_store::Store::connect(&config.db_url, config.app_secret_key.expose())
        .await
        .context("opening session store")?;
    tracing::info!(db_url = %config.db_url, "session store ready");

    // ── Event bus (§4.4) ────────────────────────────────────────────────
    let bus = ws_eventbus::EventBus::new();

    // ── Memory collaborator (§6.4, §6.5 MEMORY_MODE) ────────────────────
    let memory = ws_memory::build_memory(&config.memory, store.pool());
    tracing::info!(mode = ?config.memory.mode, "memory collaborator ready");

    // ── Runner registry (§4.5), spawned on demand per session ──────────
    let runners = Arc::new(crate::runner_registry::RunnerRegistry::new());

    let debug_settings = Arc::new(parking_lot::RwLock::new(DebugSettings {
        event_dice: config.event_dice.clone(),
        default_post_gen_delay_sec: config.default_post_gen_delay_sec,
        default_tick_label: config.default_tick_label.clone(),
    }));

    let state = AppState { config: config.clone(), store, bus, memory, runners, debug_settings };

    // ── CORS layer ───────────────────────────────────────────────────
    let cors_layer = build_cors_layer(&config.server.cors_origins);

    // ── Concurrency limit (backpressure protection) ─────────────────
    let max_concurrent = std::env::var("MAX_CONCURRENT_REQUESTS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(256);
    tracing::info!(max_concurrent, "concurrency limit set");

    let app = api::router()
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "worldline gateway listening");

    axum::serve(listener, app).await.context("axum server error")?;

    Ok(())
}

/// Build a [`CorsLayer`] from the configured allowed origins. Ported from
/// the teacher's `build_cors_layer` in `crates/gateway/src/main.rs`:
/// origins may carry a trailing `:*` wildcard for the port segment.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    use axum::http::header;

    if allowed_origins.len() == 1 && allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in allowed_origins {
        if let Some(prefix) = origin.strip_suffix('*') {
            wildcard_prefixes.push(prefix.to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
