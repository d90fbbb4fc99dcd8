//! Configuration management for stax

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project-local config file
pub const LOCAL_CONFIG_FILE: &str = "stax.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub content: ContentConfig,
    pub repository: RepositoryConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub copy: CopyConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    /// Overrides the title of the root index page
    pub root_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub dir: PathBuf,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub host: String,
    /// `owner/name`
    pub name: String,
    pub branch: String,
    /// Location of the content directory inside the repository
    pub content_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub docs_prefix: String,
    pub markdown_prefix: String,
    pub cache_control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub reset_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "myStax".to_string(),
            root_title: None,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content/docs"),
            extensions: vec!["md".to_string(), "mdx".to_string()],
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            host: "https://github.com".to_string(),
            name: "JoeBuildsStuff/myStax".to_string(),
            branch: "main".to_string(),
            content_root: "content/docs".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            docs_prefix: "/docs".to_string(),
            markdown_prefix: "/llms.mdx".to_string(),
            cache_control: "public, max-age=31536000, immutable".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
        }
    }
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self { reset_ms: 3000 }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 250,
        }
    }
}

impl CacheConfig {
    /// Capacity actually used; 0 when caching is disabled
    pub fn effective_capacity(&self) -> usize {
        if self.enabled {
            self.capacity
        } else {
            0
        }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stax")
            .map(|proj_dirs| proj_dirs.config_dir().join("stax.toml"))
    }

    /// Load configuration.
    ///
    /// Order: `explicit`, then `./stax.toml`, then the platform config file, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }

        if let Some(path) = Self::config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        // Check config file permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let perms = metadata.permissions();
            if perms.mode() & 0o002 != 0 {
                anyhow::bail!(
                    "Config file {} is world-writable (insecure permissions)",
                    path.display()
                );
            }
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
