/*++

Licensed under the Apache-2.0 license.

File Name:

   config.rs

Abstract:

    File contains utilities for parsing station configuration files

--*/

use std::path::{Path, PathBuf};

use serde_derive::Deserialize;
use uflake_identity_types::{ProvisionError, ProvisionResult};

/// Per manufacturing station defaults. Command line options take precedence.
#[derive(Default, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StationConfig {
    pub key_path: Option<PathBuf>,

    pub output_path: Option<PathBuf>,

    pub hw_version: Option<u32>,

    pub board_revision: Option<u32>,
}

/// Load Station Configuration from file
///
/// Relative paths in the file are taken relative to the file's directory.
pub(crate) fn load_station_config(path: &Path) -> ProvisionResult<StationConfig> {
    let config_str = std::fs::read_to_string(path).map_err(|source| ProvisionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config: StationConfig = toml::from_str(&config_str).map_err(|e| {
        ProvisionError::validation(format!(
            "Failed to parse config file {}: {e}",
            path.display()
        ))
    })?;

    let config_dir = path.parent().unwrap_or(Path::new(""));
    config.key_path = config.key_path.map(|p| config_dir.join(p));
    config.output_path = config.output_path.map(|p| config_dir.join(p));

    Ok(config)
}
