// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Configuration is stored in TOML format through `confy`, either at the
//! platform default location or at an explicit path.

use std::path::{Path, PathBuf};

use map_scene::{SceneConfig, SourceTemplate};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "geoscene";
const CONFIG_NAME: &str = "config";

/// Default backend host in host:port format
pub const DEFAULT_HOST: &str = "localhost:8080";

/// Default backend path prefix
pub const DEFAULT_BACK_SERVER: &str = "/api";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Backend host serving tiles and tilesets
    #[serde(default = "default_host")]
    pub host: String,

    /// Path prefix of the backend service
    #[serde(default = "default_back_server")]
    pub back_server: String,

    /// Full base URL; overrides `host` and `back_server` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Scene behavior: view state, camera presets, terrain
    #[serde(default)]
    pub scene: SceneConfig,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_back_server() -> String {
    DEFAULT_BACK_SERVER.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            host: default_host(),
            back_server: default_back_server(),
            base_url: None,
            scene: SceneConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file is created with default values.
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        match path {
            Some(path) => confy::load_path(path),
            None => confy::load(APP_NAME, CONFIG_NAME),
        }
    }

    /// Save configuration to disk
    pub fn save(&self, path: Option<&Path>) -> Result<(), confy::ConfyError> {
        match path {
            Some(path) => confy::store_path(path, self),
            None => confy::store(APP_NAME, CONFIG_NAME, self),
        }
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Address template for the configured backend.
    #[must_use]
    pub fn source_template(&self) -> SourceTemplate {
        match &self.base_url {
            Some(base) => SourceTemplate::from_base(base.as_str()),
            None => SourceTemplate::new(&self.host, &self.back_server),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_template_from_host() {
        let config = AppConfig::default();
        assert_eq!(config.source_template().base(), "http://localhost:8080/api");
    }

    #[test]
    fn test_base_url_overrides_host() {
        let config = AppConfig {
            base_url: Some("https://maps.example.org/srv/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.source_template().base(), "https://maps.example.org/srv");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"host": "10.0.0.5:9000"}"#).unwrap();
        assert_eq!(config.host, "10.0.0.5:9000");
        assert_eq!(config.back_server, DEFAULT_BACK_SERVER);
        assert_eq!(config.scene, SceneConfig::default());
    }
}
