// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Project configuration
//!
//! Read from an optional `pipedef.toml` next to the pipeline definitions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::component::{ComponentRegistry, DEFAULT_BASE_IMAGE};
use crate::errors::{PipedefError, PipedefResult};

/// Default configuration file name
pub const CONFIG_FILE: &str = "pipedef.toml";

/// Settings shared by all pipelines in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Image for components that do not name one
    pub default_base_image: String,
    /// Where `compile` writes workflows when no output is given
    pub output_dir: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_base_image: DEFAULT_BASE_IMAGE.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ProjectConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> PipedefResult<Self> {
        let config: Self = toml::from_str(content)?;
        if config.default_base_image.trim().is_empty() {
            return Err(PipedefError::Toml {
                message: "default_base_image must not be empty".into(),
            });
        }
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> PipedefResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipedefError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Load an explicitly named file, or `pipedef.toml` if present.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn discover(explicit: Option<&Path>) -> PipedefResult<Self> {
        match explicit {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                Self::from_file(path)
            }
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    debug!(path = %path.display(), "Loading configuration");
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Component registry seeded with this project's defaults
    pub fn registry(&self) -> ComponentRegistry {
        ComponentRegistry::new().with_default_base_image(self.default_base_image.as_str())
    }
}
