//! `piste doctor` — Diagnose configuration and remote connectivity.

use piste_assistant::Assistant;
use piste_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 piste Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;
    let path = super::config_file(config_path);

    let config = if path.exists() {
        match super::load_config(config_path) {
            Ok(config) => {
                println!("  ✅ Config file valid");
                config
            }
            Err(e) => {
                println!("  ❌ {e}");
                issues += 1;
                AppConfig::default()
            }
        }
    } else {
        println!("  ⚠️  No config file — run `piste onboard` (using defaults)");
        issues += 1;
        super::load_config(Some(&path)).unwrap_or_default()
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");

        let remote = piste_providers::build_from_config(&config)?;
        let assistant = Assistant::from_config(&config, remote);
        println!("  …  Probing {} ({})", config.remote.base_url, config.remote.model);
        if assistant.test_connection().await {
            println!("  ✅ Remote endpoint reachable");
        } else {
            println!("  ❌ Remote endpoint unavailable — answers will come from local knowledge");
            issues += 1;
        }
    } else {
        println!("  ⚠️  No API key — set DEEPSEEK_API_KEY or remote.api_key; local answers only");
        issues += 1;
    }

    if !config.assistant.fallback_to_local {
        println!("  ⚠️  Local fallback disabled — chat fails whenever the remote does");
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
