use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sigcolle_api::auth::{AppState, AppStateInner};
use sigcolle_api::routes;
use sigcolle_api::views::Views;

/// Placeholder session secret used when none is configured.
const DEV_SECRET: &str = "dev-secret-change-me";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigcolle=debug,sigcolle_api=debug,sigcolle_db=info,tower_http=debug".into()),
        )
        .init();

    // Config
    let session_secret =
        std::env::var("SIGCOLLE_SESSION_SECRET").unwrap_or_else(|_| DEV_SECRET.into());
    if session_secret == DEV_SECRET {
        warn!("SIGCOLLE_SESSION_SECRET is unset; using the development placeholder");
    }
    let db_path = std::env::var("SIGCOLLE_DB_PATH").unwrap_or_else(|_| "sigcolle.db".into());
    let host = std::env::var("SIGCOLLE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SIGCOLLE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database and templates
    let db = sigcolle_db::Database::open(&PathBuf::from(&db_path))?;
    let views = Views::new()?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        views,
        session_secret,
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("SigColle listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
