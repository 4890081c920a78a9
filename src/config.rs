//! Configuration management for the RAX static server
//!
//! Everything here is read once at start-up; changing it requires a restart.
//! Values come from `config.toml` with `RAX_STATIC_` environment overrides
//! (nested keys separated by `__`, e.g. `RAX_STATIC_FS__STRICT=disabled`).

use std::io;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use path_absolutize::Absolutize;
use serde::Deserialize;

use crate::storage::{AliasRule, AliasTable, ServingPolicy, StrictMode};

/// Complete server configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub fs: FsServeConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    /// Ordered alias rules; the first matching rule wins.
    #[serde(default)]
    pub alias: Vec<AliasRuleConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Serving root; relative paths resolve against the working directory.
    #[serde(default = "default_root")]
    pub root: String,

    /// Public directory relative to the root. Skipped when it does not exist.
    #[serde(default)]
    pub public_dir: Option<String>,

    /// Upper bound on the size of a request head.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

/// Filesystem serving policy (`[fs]`)
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FsServeConfig {
    #[serde(default)]
    pub strict: StrictMode,

    /// Directories files may be served from. Relative entries resolve against
    /// the root; an empty list allows the root only.
    #[serde(default)]
    pub allow: Vec<String>,
}

/// Reserved URL prefixes (`[routing]`)
#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    /// Prefix addressing absolute filesystem paths.
    #[serde(default = "default_fs_prefix")]
    pub fs_prefix: String,

    /// Query flag marking module import requests.
    #[serde(default = "default_import_marker")]
    pub import_marker: String,

    /// URL prefixes reserved for client/runtime assets.
    #[serde(default = "default_internal_prefixes")]
    pub internal_prefixes: Vec<String>,

    /// Strip `X:` drive designators from raw filesystem URLs.
    #[serde(default = "default_drive_letter_paths")]
    pub drive_letter_paths: bool,
}

/// One `[[alias]]` entry
#[derive(Debug, Deserialize, Clone)]
pub struct AliasRuleConfig {
    pub find: String,
    pub replacement: String,

    /// Treat `find` as a regular expression instead of a prefix.
    #[serde(default)]
    pub regex: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5173
}

fn default_root() -> String {
    ".".to_string()
}

fn default_max_request_bytes() -> usize {
    8192
}

fn default_fs_prefix() -> String {
    "/@fs/".to_string()
}

fn default_import_marker() -> String {
    "import".to_string()
}

fn default_internal_prefixes() -> Vec<String> {
    ["/@fs/", "/@id/", "/@vite/client", "/@vite/env"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_drive_letter_paths() -> bool {
    cfg!(windows)
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            root: default_root(),
            public_dir: None,
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fs_prefix: default_fs_prefix(),
            import_marker: default_import_marker(),
            internal_prefixes: default_internal_prefixes(),
            drive_letter_paths: default_drive_letter_paths(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `path` (extension optional, file optional)
    /// with environment overrides, then validate it.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("RAX_STATIC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration serving `root` with every other value at its default.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let mut config = Self::default();
        config.startup.root = root.as_ref().to_string_lossy().into_owned();
        config
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.startup.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.startup.root.trim().is_empty() {
            return Err(ConfigError::Message("root cannot be empty".into()));
        }

        if self.startup.max_request_bytes == 0 {
            return Err(ConfigError::Message(
                "max_request_bytes must be greater than 0".into(),
            ));
        }

        let prefix = &self.routing.fs_prefix;
        if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
            return Err(ConfigError::Message(format!(
                "routing.fs_prefix must start and end with '/': {prefix:?}"
            )));
        }

        self.alias_rules()?;
        Ok(())
    }

    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.startup.bind_address, self.startup.port)
    }

    /// Absolute serving root
    pub fn root_path(&self) -> io::Result<PathBuf> {
        Ok(Path::new(&self.startup.root).absolutize()?.into_owned())
    }

    /// Absolute public directory, if one is configured
    pub fn public_dir_path(&self, root: &Path) -> Option<PathBuf> {
        let dir = self.startup.public_dir.as_deref()?;
        Path::new(dir)
            .absolutize_from(root)
            .ok()
            .map(|p| p.into_owned())
    }

    /// Serving policy with allow-list entries resolved against `root`
    pub fn serving_policy(&self, root: &Path) -> ServingPolicy {
        let allow: Vec<PathBuf> = if self.fs.allow.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.fs
                .allow
                .iter()
                .map(|dir| {
                    Path::new(dir)
                        .absolutize_from(root)
                        .map(|p| p.into_owned())
                        .unwrap_or_else(|_| root.join(dir))
                })
                .collect()
        };
        ServingPolicy::new(self.fs.strict, allow)
    }

    /// Compiled alias rules, in configuration order
    pub fn alias_rules(&self) -> Result<Vec<AliasRule>, ConfigError> {
        self.alias
            .iter()
            .map(|rule| {
                if rule.regex {
                    AliasRule::pattern(&rule.find, rule.replacement.clone()).map_err(|e| {
                        ConfigError::Message(format!("invalid alias pattern {:?}: {e}", rule.find))
                    })
                } else {
                    Ok(AliasRule::prefix(rule.find.clone(), rule.replacement.clone()))
                }
            })
            .collect()
    }

    pub fn alias_table(&self, root: &Path) -> Result<AliasTable, ConfigError> {
        Ok(AliasTable::new(self.alias_rules()?, &root.to_string_lossy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(dir: &Path, body: &str) -> String {
        let path = dir.join("server.toml");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&tmp.path().join("absent").to_string_lossy()).unwrap();
        assert_eq!(config.startup.port, 5173);
        assert_eq!(config.fs.strict, StrictMode::Enforce);
        assert_eq!(config.routing.fs_prefix, "/@fs/");
        assert!(config.alias.is_empty());
    }

    #[test]
    fn test_full_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
port = 3000
root = "/srv/app"

[fs]
strict = "disabled"
allow = ["/srv/shared", "../lib"]

[[alias]]
find = "/@assets/"
replacement = "/src/assets/"

[[alias]]
find = "^/~/(.*)$"
replacement = "/src/$1"
regex = true
"#,
        );

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.startup.port, 3000);
        assert_eq!(config.fs.strict, StrictMode::Disabled);
        assert_eq!(config.alias_rules().unwrap().len(), 2);

        let root = Path::new("/srv/app");
        let policy = config.serving_policy(root);
        if cfg!(unix) {
            assert_eq!(policy.allow_list(), ["/srv/shared", "/srv/lib"]);
        }
    }

    #[test]
    fn test_soft_strict_from_bool() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), "[fs]\nstrict = false\n");
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.fs.strict, StrictMode::Soft);
    }

    #[test]
    fn test_empty_allow_list_defaults_to_root() {
        let config = ServerConfig::for_root("/srv/app");
        let policy = config.serving_policy(Path::new("/srv/app"));
        assert_eq!(policy.allow_list().len(), 1);
        assert!(policy.allows(&format!("{}/src/main.ts", policy.allow_list()[0])));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let tmp = tempfile::tempdir().unwrap();

        let bad_regex = write_config(
            tmp.path(),
            "[[alias]]\nfind = \"(unclosed\"\nreplacement = \"/x\"\nregex = true\n",
        );
        assert!(ServerConfig::load(&bad_regex).is_err());

        let bad_prefix = write_config(tmp.path(), "[routing]\nfs_prefix = \"@fs\"\n");
        assert!(ServerConfig::load(&bad_prefix).is_err());

        let bad_port = write_config(tmp.path(), "port = 0\n");
        assert!(ServerConfig::load(&bad_port).is_err());
    }
}
