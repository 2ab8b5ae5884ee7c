//! Renderer settings.
//!
//! Settings come from an optional TOML file layered under `DESIGNSET__*`
//! environment variables. Every field has a default, so running without a
//! settings file is the normal case during template development.

use std::{path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Environment variable prefix for settings overrides.
pub const ENV_PREFIX: &str = "DESIGNSET";

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Local design-set discovery.
    #[serde(default)]
    pub designsets: DesignSetSettings,

    /// Remote archive download.
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Rendering behaviour.
    #[serde(default)]
    pub render: RenderSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Where local design sets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSetSettings {
    /// Directory holding the design-set folders.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Folder name prefix used to discover design sets.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

/// Remote archive download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with the download request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Rendering behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Fail the whole page when a module fails instead of dropping it.
    #[serde(default)]
    pub strict_modules: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_prefix() -> String {
    "designset-".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "MakeShop Template Renderer/1.0".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for DesignSetSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            prefix: default_prefix(),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl RemoteSettings {
    /// Download timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus environment overrides.
    ///
    /// A missing file is not an error; the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file that must exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }
        Self::load(Some(path))
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(CoreError::config("server.bind cannot be empty"));
        }

        if self.remote.timeout_secs == 0 {
            return Err(CoreError::config("remote.timeout_secs must be positive"));
        }

        if self.designsets.prefix.is_empty() {
            return Err(CoreError::config("designsets.prefix cannot be empty"));
        }

        if !self.designsets.root.exists() {
            tracing::warn!(
                root = %self.designsets.root.display(),
                "design set root does not exist"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).expect("load defaults");

        assert_eq!(settings.remote.timeout_secs, 30);
        assert_eq!(settings.remote.user_agent, "MakeShop Template Renderer/1.0");
        assert_eq!(settings.designsets.prefix, "designset-");
        assert!(!settings.render.strict_modules);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("designset.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "0.0.0.0:9000"

[designsets]
root = "html"

[remote]
timeout_secs = 5

[render]
strict_modules = true
"#,
        )
        .expect("write");

        let settings = Settings::load_file(&path).expect("load settings");

        assert_eq!(settings.server.bind, "0.0.0.0:9000");
        assert_eq!(settings.designsets.root, PathBuf::from("html"));
        assert_eq!(settings.designsets.prefix, "designset-");
        assert_eq!(settings.remote.timeout(), Duration::from_secs(5));
        assert!(settings.render.strict_modules);
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let settings =
            Settings::load(Some(Path::new("/nonexistent/designset.toml"))).expect("defaults");
        assert_eq!(settings.remote.timeout_secs, 30);
    }

    #[test]
    fn test_load_file_not_found() {
        let result = Settings::load_file(Path::new("/nonexistent/designset.toml"));
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("designset.toml");
        std::fs::write(&path, "[remote]\ntimeout_secs = 0\n").expect("write");

        let err = Settings::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }
}
