//! Static configuration, loaded once at startup.
//!
//! The file is YAML (or JSON) with every key under a `swagger_faker:`
//! namespace:
//!
//! ```yaml
//! swagger_faker:
//!   schema: petstore.yaml
//!   enabled: true
//!   hijack: false
//!   get: 200
//!   max_items: 5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use swagger_faker_generator::Constraints;

use crate::error::ConfigError;

/// Immutable interceptor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakerConfig {
    /// Reference to the API document (a file path, relative to the config
    /// file when loaded from disk).
    pub schema: String,

    /// When false the interceptor is inert and header overrides are ignored.
    #[serde(default)]
    pub enabled: bool,

    /// Mock every request, routed or not.
    #[serde(default)]
    pub hijack: bool,

    #[serde(default)]
    pub seed: Option<i64>,

    #[serde(default = "default_get")]
    pub get: i64,
    #[serde(default = "default_post")]
    pub post: i64,
    #[serde(default = "default_put")]
    pub put: i64,
    #[serde(default = "default_patch")]
    pub patch: i64,
    #[serde(default = "default_delete")]
    pub delete: i64,

    #[serde(default = "default_max_items")]
    pub max_items: i64,
    #[serde(default)]
    pub min_items: i64,
    #[serde(default)]
    pub unique_items: bool,
    #[serde(default = "default_multiple_of")]
    pub multiple_of: i64,
    #[serde(default = "default_maximum")]
    pub maximum: i64,
    #[serde(default)]
    pub minimum: i64,
    #[serde(default = "default_chance_required")]
    pub chance_required: i64,
    #[serde(default = "default_max_length")]
    pub max_length: i64,
    #[serde(default)]
    pub min_length: i64,
}

fn default_get() -> i64 {
    200
}

fn default_post() -> i64 {
    201
}

fn default_put() -> i64 {
    200
}

fn default_patch() -> i64 {
    204
}

fn default_delete() -> i64 {
    204
}

fn default_max_items() -> i64 {
    10
}

fn default_multiple_of() -> i64 {
    1
}

fn default_maximum() -> i64 {
    1_000_000
}

fn default_chance_required() -> i64 {
    80
}

fn default_max_length() -> i64 {
    255
}

/// On-disk layout: everything lives under one namespace key.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    swagger_faker: FakerConfig,
}

impl FakerConfig {
    /// Configuration with every default and the given document reference.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            enabled: false,
            hijack: false,
            seed: None,
            get: default_get(),
            post: default_post(),
            put: default_put(),
            patch: default_patch(),
            delete: default_delete(),
            max_items: default_max_items(),
            min_items: 0,
            unique_items: false,
            multiple_of: default_multiple_of(),
            maximum: default_maximum(),
            minimum: 0,
            chance_required: default_chance_required(),
            max_length: default_max_length(),
            min_length: 0,
        }
    }

    /// Parse a configuration document.
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(input)?;
        let config = file.swagger_faker;
        if config.schema.trim().is_empty() {
            return Err(ConfigError::MissingSchema);
        }
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Status code configured for a lower-cased method name.
    pub fn default_status(&self, operation: &str) -> Option<i64> {
        match operation {
            "get" => Some(self.get),
            "post" => Some(self.post),
            "put" => Some(self.put),
            "patch" => Some(self.patch),
            "delete" => Some(self.delete),
            _ => None,
        }
    }

    /// Generation constraints before any header override.
    pub fn constraints(&self) -> Constraints {
        Constraints {
            max_items: self.max_items,
            min_items: self.min_items,
            unique_items: self.unique_items,
            multiple_of: self.multiple_of,
            maximum: self.maximum,
            minimum: self.minimum,
            chance_required: self.chance_required,
            max_length: self.max_length,
            min_length: self.min_length,
        }
    }

    /// Location of the API document, resolving relative references against
    /// `base_dir`.
    pub fn schema_path(&self, base_dir: &Path) -> PathBuf {
        let schema = Path::new(&self.schema);
        if schema.is_absolute() {
            schema.to_path_buf()
        } else {
            base_dir.join(schema)
        }
    }
}
