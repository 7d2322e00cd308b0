//! Logging and config-file helpers for the `vessel-patches` tool.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{Error, Result};

/// Installs the global subscriber. Unless `RUST_LOG` is set, `verbose`
/// shows per-file candidate counts and sampled augmentation parameters.
pub fn setup_cli_logging(verbose: bool) -> Result<()> {
    // RUST_LOG wins over the verbosity flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "info,vessel_core=debug,vessel_data=debug,vessel_patches=debug"
        } else {
            "info"
        })
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logger: {e}")))?;

    Ok(())
}

/// Reads a TOML file such as a `ProviderConfig`; fields left out keep their
/// defaults.
pub fn load_toml_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderConfig;

    #[test]
    fn test_load_toml_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("provider.toml");
        fs::write(&path, "patch_size = 31\nundersample_ratio = 0.5\n").unwrap();

        let config: ProviderConfig = load_toml_config(&path).unwrap();
        assert_eq!(config.patch_size, 31);
        assert_eq!(config.undersample_ratio, 0.5);
    }

    #[test]
    fn test_load_missing_config() {
        let result: Result<ProviderConfig> = load_toml_config(Path::new("/nonexistent/provider.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
