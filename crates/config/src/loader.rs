use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::schema::NotariumConfig;

/// Config file name, checked project-local then user-global.
const CONFIG_FILENAME: &str = "notarium.toml";

static CONFIG_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);
static DATA_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<NotariumConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./notarium.toml` (project-local)
/// 2. `<config dir>/notarium.toml` (user-global)
///
/// Returns `NotariumConfig::default()` if no config file is found. Environment
/// overrides are applied on top in either case.
pub fn discover_and_load() -> NotariumConfig {
    let config = if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                NotariumConfig::default()
            },
        }
    } else {
        debug!("no config file found, using defaults");
        NotariumConfig::default()
    };
    apply_env_overrides(config)
}

/// Overlay `NOTARIUM_*` environment variables onto a loaded config.
///
/// Recognized: `NOTARIUM_VAULT_KEY`, `NOTARIUM_ASSISTANT_API_KEY`,
/// `NOTARIUM_BIND`, `NOTARIUM_PORT`.
pub fn apply_env_overrides(mut config: NotariumConfig) -> NotariumConfig {
    if let Ok(key) = std::env::var("NOTARIUM_VAULT_KEY")
        && !key.is_empty()
    {
        config.vault.key = Some(Secret::new(key));
    }
    if let Ok(key) = std::env::var("NOTARIUM_ASSISTANT_API_KEY")
        && !key.is_empty()
    {
        config.assistant.api_key = Some(Secret::new(key));
    }
    if let Ok(bind) = std::env::var("NOTARIUM_BIND")
        && !bind.is_empty()
    {
        config.server.bind = bind;
    }
    if let Ok(port) = std::env::var("NOTARIUM_PORT")
        && let Ok(port) = port.parse()
    {
        config.server.port = port;
    }
    config
}

fn find_config_file() -> Option<PathBuf> {
    // Project-local
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    // User-global
    let p = config_dir()?.join(CONFIG_FILENAME);
    p.exists().then_some(p)
}

/// Returns the config directory.
///
/// Resolution order:
/// 1. programmatic override ([`set_config_dir`])
/// 2. `NOTARIUM_CONFIG_DIR`
/// 3. `~/.config/notarium/`
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(guard) = CONFIG_DIR_OVERRIDE.read()
        && let Some(dir) = guard.as_ref()
    {
        return Some(dir.clone());
    }
    if let Ok(dir) = std::env::var("NOTARIUM_CONFIG_DIR")
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    directories::ProjectDirs::from("", "", "notarium").map(|d| d.config_dir().to_path_buf())
}

/// Override the config directory for this process (tests, `--config-dir`).
pub fn set_config_dir(dir: impl Into<PathBuf>) {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = Some(dir.into());
    }
}

pub fn clear_config_dir() {
    if let Ok(mut guard) = CONFIG_DIR_OVERRIDE.write() {
        *guard = None;
    }
}

/// Returns the data directory (SQLite database lives here).
///
/// Resolution order:
/// 1. programmatic override ([`set_data_dir`])
/// 2. `NOTARIUM_DATA_DIR`
/// 3. `~/.local/share/notarium/`
/// 4. `.` as a last resort
pub fn data_dir() -> PathBuf {
    if let Ok(guard) = DATA_DIR_OVERRIDE.read()
        && let Some(dir) = guard.as_ref()
    {
        return dir.clone();
    }
    if let Ok(dir) = std::env::var("NOTARIUM_DATA_DIR")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    directories::ProjectDirs::from("", "", "notarium")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Override the data directory for this process (tests, `--data-dir`).
pub fn set_data_dir(dir: impl Into<PathBuf>) {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = Some(dir.into());
    }
}

pub fn clear_data_dir() {
    if let Ok(mut guard) = DATA_DIR_OVERRIDE.write() {
        *guard = None;
    }
}

/// Returns the path of an existing config file, or the default user-global path.
pub fn find_or_default_config_path() -> PathBuf {
    if let Some(path) = find_config_file() {
        return path;
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILENAME)
}

/// Serialize `config` to TOML and write it to the config path.
///
/// Creates parent directories if needed. Returns the path written to.
pub fn save_config(config: &NotariumConfig) -> anyhow::Result<PathBuf> {
    let path = find_or_default_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // One test exercises the directory override end to end; the override is a
    // process-wide static, so keeping it in a single #[test] avoids races.
    #[test]
    fn discover_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path());

        // Nothing on disk yet: defaults.
        let cfg = discover_and_load();
        assert_eq!(cfg.server.bind, "127.0.0.1");

        // Save, then discover again and see the saved values.
        let mut cfg = NotariumConfig::default();
        cfg.server.port = 9911;
        let written = save_config(&cfg).unwrap();
        assert_eq!(written, dir.path().join(CONFIG_FILENAME));

        let reloaded = discover_and_load();
        assert_eq!(reloaded.server.port, 9911);

        clear_config_dir();
    }

    #[test]
    fn load_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "definitely [not toml").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn data_dir_override_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        set_data_dir(dir.path());
        assert_eq!(data_dir(), dir.path());
        clear_data_dir();
    }
}
