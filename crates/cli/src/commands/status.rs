//! `piste status` — Show configuration and assistant status.

use piste_assistant::Assistant;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let remote = piste_providers::build_from_config(&config)?;
    let status = Assistant::from_config(&config, remote).status();

    println!("🤺 piste Status");
    println!("===============");
    println!("  Config file:  {}", super::config_file(config_path).display());
    println!("  Mode:         {}", status.mode);
    println!(
        "  Remote:       {}",
        status.remote_name.as_deref().unwrap_or("not configured")
    );
    println!("  Endpoint:     {}", config.remote.base_url);
    println!("  Model:        {}", config.remote.model);
    println!("  Temperature:  {}", config.remote.temperature);
    println!("  Timeout:      {}s", config.remote.timeout_secs);
    println!(
        "  Fallback:     {}",
        if status.fallback_enabled { "enabled" } else { "disabled" }
    );
    println!("  History cap:  {} turns", config.assistant.history_cap);
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    match config.generators.seed {
        Some(seed) => println!("  RNG seed:     {seed}"),
        None => println!("  RNG seed:     random"),
    }

    if super::config_file(config_path).exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `piste onboard` first");
    }

    Ok(())
}
