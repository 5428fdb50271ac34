//! Visual Matcher Server binary
//!
//! Loads configuration from the environment (and an optional config file),
//! then starts the HTTP search server.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
