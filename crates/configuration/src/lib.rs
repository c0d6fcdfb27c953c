use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    ConnectionSettings, DatabaseSettings, MigrationSettings, PoolSettings, Settings,
};

/// Loads the application configuration from the given TOML file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, layers `PLINTH_`-prefixed environment variables on
/// top (e.g. `PLINTH_DATABASE__PASSWORD` overrides `database.password`),
/// and deserializes the result into our strongly-typed `Settings` struct.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        // Environment variables win over the file, so deployments can
        // override single values without editing it.
        .add_source(config::Environment::with_prefix("PLINTH").separator("__"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;

    Ok(settings)
}
