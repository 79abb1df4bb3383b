mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Returns the config directory: `<config_dir>/teapot/`
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("teapot");
    Ok(dir)
}

/// Returns the config file path: `<config_dir>/teapot/config.toml`
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from `path`, or return default if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        info!(?path, "Loaded config");
        Ok(config)
    } else {
        info!(?path, "No config found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load config from the default location.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

/// Write config to `path`, creating parent directories.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    info!(?path, "Saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("teapot-config-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config_from(&scratch_path("absent.toml")).unwrap();
        assert_eq!(config.sample_mode, SampleMode::Quaternion);
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_path("saved.toml");
        let mut config = AppConfig::default();
        config.sample_mode = SampleMode::Euler;
        config.scene = SceneConfig::axes();
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.sample_mode, SampleMode::Euler);
        assert_eq!(loaded.scene.target, DrawTarget::Axes);

        std::fs::remove_file(&path).ok();
    }
}
