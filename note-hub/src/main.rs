use std::sync::Arc;

use axum::{routing::get, serve, Router};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use note_hub::{api, auth};
use note_hub_core::service::NoteHubService;
use note_hub_core::store::MemoryStore;

#[derive(Parser, Debug)]
#[command(name = "note-hub", about = "Multi-tenant note/folder organizer")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// Shared secret for HS256 bearer tokens. Without it only the
    /// X-User-Id header authenticates.
    #[arg(long)]
    token_secret: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(NoteHubService::new(store));
    let verifier: Arc<dyn auth::TokenVerifier> = match args.token_secret {
        Some(secret) => Arc::new(auth::Hs256Verifier::new(secret)),
        None => Arc::new(auth::DenyAllVerifier),
    };

    let app = Router::new()
        .merge(api::router(service, verifier))
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&args.bind).await?;
    tracing::info!(addr = %args.bind, "listening");
    serve(listener, app.into_make_service()).await?;
    Ok(())
}
