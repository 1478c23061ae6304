//! Layered configuration for errgen.
//!
//! Sources are merged in order, later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]),
//! 2. An optional config file (TOML, YAML or JSON, chosen by extension),
//! 3. Environment variables prefixed with `ERRGEN_` (e.g. `ERRGEN_AUTO_UPDATE_STACK=true`).
//!
//! Besides the process-wide flags, a config may declare a *catalog* of error
//! types up front, so that applications can keep their error vocabulary in a
//! file instead of scattering declarations through the code.
//!
//! ```toml
//! auto_update_stack = true
//!
//! [[catalog]]
//! name = "http.RequestError"
//! properties = ["message", "status"]
//!
//! [[catalog]]
//! name = "http.TimeoutError"
//! properties = { message = "request timed out", status = 504 }
//! base = "http.RequestError"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "ERRGEN_";
/// File name looked up in the user configuration directory.
pub const DEFAULT_FILE_NAME: &str = "errgen.toml";

/// Process-wide settings plus an optional catalog of error type declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rewrite the first stack line whenever an error's message is changed.
    pub auto_update_stack: bool,
    /// Error types to declare, in order. Bases must be declared first.
    pub catalog: Vec<TypeDecl>,
}

/// A single declared error type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Canonical (possibly dot-scoped) name.
    pub name: String,
    /// `null`/missing, an array of property names, or a map of property defaults.
    #[serde(default)]
    pub properties: serde_json::Value,
    /// Canonical name of the base type, or `"Error"` for the native root.
    #[serde(default)]
    pub base: Option<String>,
}
impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: serde_json::Value::Null,
            base: None,
        }
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

impl Config {
    /// Location of the per-user config file (`errgen.toml` in the platform
    /// config directory). The file does not have to exist.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "errgen").ok_or_raise(|| ErrorKind::NoConfigDir)?;
        Ok(dirs.config_dir().join(DEFAULT_FILE_NAME))
    }

    /// Builds the layered [`Figment`] without extracting it.
    ///
    /// A missing file is not an error; it simply contributes nothing.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Loads configuration from defaults, the given file (if any) and the environment.
    #[instrument(skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path).extract().or_raise(|| ErrorKind::Load)?;
        tracing::debug!(
            auto_update_stack = config.auto_update_stack,
            catalog = config.catalog.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads configuration using [`Config::default_path`].
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load(Some(&path))
    }
}
