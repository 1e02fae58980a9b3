//! Runnable combat-arena server with the dev authenticator: any non-empty
//! token is accepted as the account identity.
//!
//! ```text
//! RUST_LOG=info cargo run -p combat-arena
//! ```

use skirmish::{ArenaServer, ServerConfig, TokenIdentity};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig {
        bind_addr: "0.0.0.0:8080".to_string(),
        ..ServerConfig::default()
    };

    let server = ArenaServer::bind(config, TokenIdentity).await?;
    tracing::info!("combat arena ready");
    server.run().await?;
    Ok(())
}
