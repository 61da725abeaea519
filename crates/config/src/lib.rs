//! Configuration loading and schema.
//!
//! Config file: `notarium.toml`, searched in `./` then `~/.config/notarium/`.
//! `NOTARIUM_*` environment variables override file values, so secrets can
//! stay out of the file entirely.

pub mod loader;
pub mod schema;

pub use {
    loader::{
        apply_env_overrides, clear_config_dir, clear_data_dir, config_dir, data_dir,
        discover_and_load, find_or_default_config_path, load_config, save_config, set_config_dir,
        set_data_dir,
    },
    schema::{AssistantConfig, NotariumConfig, ServerConfig, VaultConfig},
};
