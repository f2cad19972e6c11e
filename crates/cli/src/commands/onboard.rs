//! `piste onboard` — Write a default config file.

use piste_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_file(config_path);

    println!("🤺 piste — First-Time Setup");
    println!("===========================\n");

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if path.exists() {
        println!("\n⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", path.display());
    println!("\n📝 Next steps:");
    println!("   1. Add your API key under [remote] (or export DEEPSEEK_API_KEY)");
    println!("   2. Run: piste chat -m \"击剑比赛如何计分？\"");
    println!("   3. Run: piste serve\n");

    Ok(())
}
