pub mod chat;
pub mod doctor;
pub mod onboard;
pub mod serve;
pub mod status;

use piste_config::AppConfig;
use std::path::Path;

/// Load config from `path` when given, otherwise from the default location.
/// Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
    let result = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    result.map_err(|e| format!("Failed to load config: {e}"))
}

/// Where `onboard` writes and `doctor` looks.
pub fn config_file(path: Option<&Path>) -> std::path::PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}
