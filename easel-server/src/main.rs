//! Easel backend server.
//!
//! Environment:
//! - `EASEL_BIND`      — listen address (default `127.0.0.1:9090`)
//! - `EASEL_DATA_DIR`  — RocksDB directory; unset means in-memory documents
//! - `GEMINI_API_KEY`  — enables text generation
//! - `IMAGE_API_URL` / `IMAGE_API_KEY` — enables image generation
//! - `RUST_LOG`        — log filter (env_logger)

use std::sync::Arc;

use easel_ai::{GeminiClient, ImageClient};
use easel_collab::{CollabServer, Relay, ServerConfig, SessionCoordinator};
use easel_store::{DocumentStore, MemoryStore, RocksStore, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let bind_addr =
        std::env::var("EASEL_BIND").unwrap_or_else(|_| "127.0.0.1:9090".to_string());

    let store: Arc<dyn DocumentStore> = match std::env::var("EASEL_DATA_DIR") {
        Ok(dir) if !dir.is_empty() => {
            log::info!("document store: RocksDB at {dir}");
            let config = StoreConfig {
                path: dir.into(),
                ..StoreConfig::default()
            };
            Arc::new(RocksStore::open(config)?)
        }
        _ => {
            log::warn!("EASEL_DATA_DIR not set, documents are held in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    match GeminiClient::from_env() {
        Ok(_) => log::info!("text generation: available"),
        Err(e) => log::warn!("text generation: {e}"),
    }
    match ImageClient::from_env() {
        Ok(_) => log::info!("image generation: available"),
        Err(e) => log::warn!("image generation: {e}"),
    }

    let coordinator = Arc::new(SessionCoordinator::new(Arc::new(Relay::new()), store));
    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };
    let server = CollabServer::new(config, coordinator);
    server.run().await?;
    Ok(())
}
