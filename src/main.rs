use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use promodesk::registry::checker::HttpChecker;
use promodesk::registry::CredentialRegistry;
use promodesk::store::SqliteStore;
use promodesk::vault::VaultCrypto;
use promodesk::{api, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "promodesk=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse first: --help/--version must work without a master key.
    let args = cli::Cli::parse();
    let cfg = config::load()?;

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Service { command }) => {
            let registry = build_registry(&cfg).await?;
            handle_service_command(command, &registry).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn build_registry(cfg: &config::Config) -> anyhow::Result<CredentialRegistry> {
    let store = SqliteStore::connect(&cfg.database_url).await?;
    store.migrate().await?;
    let crypto = VaultCrypto::new(&cfg.master_key)?;
    Ok(CredentialRegistry::new(
        store,
        crypto,
        Arc::new(HttpChecker::new()),
        Duration::from_secs(cfg.test_timeout_secs),
    ))
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Opening store at {}...", cfg.database_url);
    let registry = build_registry(&cfg).await?;

    let state = Arc::new(AppState {
        registry,
        config: cfg,
    });

    let app = axum::Router::new()
        // Health endpoints (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .route("/readyz", axum::routing::get(readiness_check))
        // Dashboard API — nested under /api (preserves middleware + fallback)
        .nest("/api", api::api_router(state.clone()))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // Restrict CORS to the dashboard origin (DASHBOARD_ORIGIN env var,
        // defaults to localhost for dev)
        .layer({
            use axum::http::{HeaderName, Method};
            use tower_http::cors::AllowOrigin;
            let dashboard_origin = std::env::var("DASHBOARD_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string());
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == dashboard_origin
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("authorization"),
                    HeaderName::from_static("x-admin-key"),
                    HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true)
        })
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Promodesk backend listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn readiness_check() -> &'static str {
    "ok"
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows the dashboard to correlate errors with backend logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    // Responses carry configuration metadata; keep them out of caches
    headers.insert("Cache-Control", "no-store".parse().unwrap());
    headers.insert("Referrer-Policy", "no-referrer".parse().unwrap());
    headers.remove("Server");

    resp
}

async fn handle_service_command(
    cmd: cli::ServiceCommands,
    registry: &CredentialRegistry,
) -> anyhow::Result<()> {
    match cmd {
        cli::ServiceCommands::List => {
            let report = registry.get_status().await?;
            println!(
                "{:<28} {:<18} {:<16} {:<10}",
                "SERVICE", "CATEGORY", "STATUS", "TESTED"
            );
            for s in &report.services {
                let tested = s
                    .last_tested_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<28} {:<18} {:<16} {:<10}",
                    s.name,
                    s.category.as_str(),
                    s.status.as_str(),
                    tested
                );
            }
            println!(
                "\n{} of {} services configured ({:?})",
                report.configured_services,
                report.total_services,
                report.overall_health
            );
        }
        cli::ServiceCommands::Configure { name, key, fields } => {
            let descriptor = registry.descriptor(&name)?;
            let mut map: HashMap<String, String> = fields.into_iter().collect();
            if let (Some(primary), Some(key)) = (descriptor.primary, key) {
                map.insert(primary.to_string(), key);
            }
            registry.configure(&name, &map).await?;
            println!(
                "Configuration saved for '{}' (status: disconnected — run `promodesk service test {}` to verify)",
                name, name
            );
        }
        cli::ServiceCommands::Test { name } => {
            let outcome = registry.test_connection(&name).await?;
            if outcome.success {
                println!("Service '{}' is connected.", name);
            } else {
                println!(
                    "Service '{}' test failed ({:?}): {}",
                    name,
                    outcome
                        .cause
                        .unwrap_or(promodesk::models::service::FailureKind::Unknown),
                    outcome.message.as_deref().unwrap_or("no detail")
                );
            }
        }
        cli::ServiceCommands::Remove { name } => {
            registry.remove_configuration(&name).await?;
            println!("Configuration for '{}' removed.", name);
        }
    }
    Ok(())
}
