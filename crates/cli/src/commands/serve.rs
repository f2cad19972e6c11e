//! `piste serve` — Start the HTTP API server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🤺 piste API");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Remote:    {}",
        if config.has_api_key() {
            config.remote.model.as_str()
        } else {
            "not configured (local answers only)"
        }
    );

    piste_gateway::start(config).await?;

    Ok(())
}
