use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use canvas_notes::{config::Config, handlers::rest, repository::Repository, service::NoteService};

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    let cfg = Config::from_env();

    // Store connection and migration; a broken backend at boot is fatal
    let mut repo = Repository::new(&cfg.pg_dsn).await.unwrap_or_else(|e| {
        tracing::error!("Failed to establish database connection: {e}");
        panic!("failed to establish database connection: {e}");
    });

    repo.migrate().await.unwrap_or_else(|e| {
        tracing::error!("Failed to migrate database: {e}");
        panic!("failed to migrate database: {e}");
    });

    let service = Arc::new(NoteService::new(Arc::new(repo), cfg.db_name.clone()));

    let mut origins: Vec<HeaderValue> = Vec::new();
    for origin in &cfg.allowed_origins {
        match origin.parse() {
            Ok(value) => origins.push(value),
            Err(e) => tracing::warn!("Skipping invalid allowed origin '{origin}': {e}"),
        }
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    let router = rest::router(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener
        .local_addr()
        .expect("Failed to read bound address");

    tracing::info!("Note server starting, listening on {} (db: {})", addr, cfg.db_name);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
