//! Configuration loading.
//!
//! Settings come from an optional TOML file, then environment overrides:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `SERVER_BASE_URL` | `backend.base_url` |
//! | `AUTODOC_BIND` | `server.bind` |
//! | `REPO_URL` | `mcp.default_repo_url` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const ENV_BACKEND_URL: &str = "SERVER_BASE_URL";
pub const ENV_BIND: &str = "AUTODOC_BIND";
pub const ENV_REPO_URL: &str = "REPO_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the documentation cache service (no trailing path).
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8001".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct McpConfig {
    /// Repository used by tools when a call omits `repo_url`.
    #[serde(default)]
    pub default_repo_url: Option<String>,
}

impl Config {
    /// Defaults plus environment overrides, for running without a config file.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend.base_url = url;
        }
        if let Some(bind) = get(ENV_BIND) {
            self.server.bind = bind;
        }
        if let Some(repo) = get(ENV_REPO_URL) {
            self.mcp.default_repo_url = Some(repo);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            bail!("server.bind must not be empty");
        }

        let url = url::Url::parse(&self.backend.base_url)
            .with_context(|| format!("backend.base_url is not a URL: {}", self.backend.base_url))?;
        match url.scheme() {
            "http" | "https" => {}
            other => bail!(
                "backend.base_url must use http or https, got '{}'",
                other
            ),
        }

        Ok(())
    }
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. Environment overrides apply in both cases.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Config::from_env();
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config =
        toml::from_str::<Config>(&content).with_context(|| "Failed to parse config file")?;

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.backend.base_url, "http://localhost:8001");
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
        assert!(cfg.mcp.default_repo_url.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let cfg: Config = toml::from_str(
            r#"
[backend]
base_url = "http://cache.internal:9000"
"#,
        )
        .unwrap();
        assert_eq!(cfg.backend.base_url, "http://cache.internal:9000");
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "https://wiki.example.com"),
            (ENV_BIND, "0.0.0.0:8080"),
            (ENV_REPO_URL, "https://github.com/acme/widgets"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.backend.base_url, "https://wiki.example.com");
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(
            cfg.mcp.default_repo_url.as_deref(),
            Some("https://github.com/acme/widgets")
        );
    }

    #[test]
    fn test_blank_env_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env(|_| Some("  ".to_string()));
        assert_eq!(cfg.backend.base_url, "http://localhost:8001");
        assert!(cfg.mcp.default_repo_url.is_none());
    }

    #[test]
    fn test_rejects_non_http_backend() {
        let mut cfg = Config::default();
        cfg.backend.base_url = "ftp://cache".to_string();
        assert!(cfg.validate().is_err());

        cfg.backend.base_url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let cfg: Config =
            toml::from_str(include_str!("../config/autodoc.example.toml")).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_load_missing_file_matches_from_env() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loaded = load_config(&tmp.path().join("absent.toml")).unwrap();
        let from_env = Config::from_env().unwrap();
        assert_eq!(loaded.server.bind, from_env.server.bind);
        assert_eq!(loaded.backend.base_url, from_env.backend.base_url);
        assert_eq!(loaded.mcp.default_repo_url, from_env.mcp.default_repo_url);
    }

    #[test]
    fn test_load_file_then_env() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("autodoc.toml");
        std::fs::write(&path, "[server]\nbind = \"0.0.0.0:4100\"\n").unwrap();

        let cfg = load_config(&path).unwrap();
        let mut expected = Config::default();
        expected.server.bind = "0.0.0.0:4100".to_string();
        expected.apply_env(|key| std::env::var(key).ok());
        assert_eq!(cfg.server.bind, expected.server.bind);
    }
}
