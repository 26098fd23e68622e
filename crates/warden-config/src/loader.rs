//! Configuration loader with multi-source merging

use crate::{Paths, WardenConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Keys whose environment values are comma-separated lists.
const LIST_KEYS: &[&str] = &[
    "locked",
    "allow_roles",
    "allow_users",
    "deny_roles",
    "deny_users",
    "values",
];

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    env_vars: Option<Vec<(String, String)>>,
    explicit_file: Option<PathBuf>,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "WARDEN".to_string(),
            env_vars: None,
            explicit_file: None,
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Layer an explicit config file on top of every other source.
    /// The file must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix (default: "WARDEN")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read overrides from these variables instead of the process environment
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Skip ~/.config/warden/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<WardenConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = WardenConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/warden/config.toml)
        if self.user_config {
            let paths = Paths::new();
            if let Ok(user_config_file) = paths.user_config_file() {
                if user_config_file.exists() {
                    builder = builder.add_source(toml_file(user_config_file, false));
                }
            }
        }

        // 3. Project config (warden.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(toml_file(project_config_file, false));
        }

        // 4. Local config (warden.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(toml_file(local_config_file, false));
        }

        // 5. Environment variables (WARDEN_*). List fields are split on ','
        // here, the rest go through the typed environment source.
        let vars = self.env_vars.unwrap_or_else(process_env);
        let (lists, scalars): (Vec<_>, Vec<_>) = vars
            .into_iter()
            .partition(|(name, _)| list_key(&self.env_prefix, name).is_some());

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(scalars.into_iter().collect())),
        );

        let mut list_overrides = config::Config::builder();
        for (name, value) in &lists {
            if let Some(key) = list_key(&self.env_prefix, name) {
                let items: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect();
                list_overrides = list_overrides
                    .set_override(&key, items)
                    .with_context(|| format!("Invalid list override in {name}"))?;
            }
        }
        builder = builder.add_source(
            list_overrides
                .build()
                .context("Failed to build list overrides")?,
        );

        // 6. Explicit file
        if let Some(file) = self.explicit_file {
            builder = builder.add_source(toml_file(file, true));
        }

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> WardenConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn process_env() -> Vec<(String, String)> {
    env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Maps `PREFIX_POLICIES__OPS__ALLOW_ROLES` to `policies.ops.allow_roles` when
/// the last segment names a list field.
fn list_key(prefix: &str, name: &str) -> Option<String> {
    let name = name.to_lowercase();
    let rest = name.strip_prefix(&format!("{}_", prefix.to_lowercase()))?;
    let key = rest.replace("__", ".");
    let field = key.rsplit('.').next()?;

    LIST_KEYS.contains(&field).then_some(key)
}

fn toml_file(path: PathBuf, required: bool) -> impl config::Source + Send + Sync + 'static {
    config::File::from(path)
        .required(required)
        .format(config::FileFormat::Toml)
}
