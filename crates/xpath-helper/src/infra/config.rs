//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".xpath-helper/config.toml";

/// Class prefix owned by the tool itself; always reserved regardless of config.
pub const BUILTIN_RESERVED_PREFIX: &str = "xpath-helper";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "QueryConfig::default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "QueryConfig::default_flash_ms")]
    pub flash_ms: u64,
    #[serde(default = "QueryConfig::default_max_results")]
    pub max_results: usize,
    #[serde(default = "QueryConfig::default_text_preview_chars")]
    pub text_preview_chars: usize,
    #[serde(default = "QueryConfig::default_class_preview_chars")]
    pub class_preview_chars: usize,
}

impl QueryConfig {
    fn default_debounce_ms() -> u64 {
        500
    }

    fn default_flash_ms() -> u64 {
        1000
    }

    fn default_max_results() -> usize {
        100
    }

    fn default_text_preview_chars() -> usize {
        200
    }

    fn default_class_preview_chars() -> usize {
        80
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
            flash_ms: Self::default_flash_ms(),
            max_results: Self::default_max_results(),
            text_preview_chars: Self::default_text_preview_chars(),
            class_preview_chars: Self::default_class_preview_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "LocatorConfig::default_panel_id")]
    pub panel_id: String,
    #[serde(default = "LocatorConfig::default_reserved_class_prefixes")]
    pub reserved_class_prefixes: Vec<String>,
}

impl LocatorConfig {
    fn default_panel_id() -> String {
        "xpath-helper-panel".into()
    }

    fn default_reserved_class_prefixes() -> Vec<String> {
        vec![BUILTIN_RESERVED_PREFIX.into()]
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            panel_id: Self::default_panel_id(),
            reserved_class_prefixes: Self::default_reserved_class_prefixes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Tree,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".into()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    debounce_ms: Option<String>,
    log_level: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            debounce_ms: env::var("XPATH_HELPER_DEBOUNCE_MS").ok(),
            log_level: env::var("XPATH_HELPER_LOG").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(debounce_ms: &str, log_level: &str) -> Self {
        Self {
            debounce_ms: Some(debounce_ms.to_owned()),
            log_level: Some(log_level.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            query: merge_query(self.query, other.query),
            locator: merge_locator(self.locator, other.locator),
            logging: merge_logging(self.logging, other.logging),
        }
    }
}

fn merge_query(base: QueryConfig, overlay: QueryConfig) -> QueryConfig {
    let defaults = QueryConfig::default();
    QueryConfig {
        debounce_ms: choose(base.debounce_ms, overlay.debounce_ms, defaults.debounce_ms),
        flash_ms: choose(base.flash_ms, overlay.flash_ms, defaults.flash_ms),
        max_results: choose(base.max_results, overlay.max_results, defaults.max_results),
        text_preview_chars: choose(
            base.text_preview_chars,
            overlay.text_preview_chars,
            defaults.text_preview_chars,
        ),
        class_preview_chars: choose(
            base.class_preview_chars,
            overlay.class_preview_chars,
            defaults.class_preview_chars,
        ),
    }
}

fn merge_locator(base: LocatorConfig, overlay: LocatorConfig) -> LocatorConfig {
    let mut prefixes: BTreeSet<String> = base.reserved_class_prefixes.into_iter().collect();
    prefixes.extend(overlay.reserved_class_prefixes);
    prefixes.insert(BUILTIN_RESERVED_PREFIX.into());

    LocatorConfig {
        panel_id: choose(base.panel_id, overlay.panel_id, LocatorConfig::default_panel_id()),
        reserved_class_prefixes: prefixes.into_iter().collect(),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    LoggingConfig {
        level: choose(base.level, overlay.level, LoggingConfig::default_level()),
        format: choose(base.format, overlay.format, LogFormat::default()),
    }
}

fn choose<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default { overlay } else { base }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("xpath-helper/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(debounce) = env.debounce_ms {
        config.query.debounce_ms = debounce
            .trim()
            .parse()
            .with_context(|| format!("XPATH_HELPER_DEBOUNCE_MS is not a number: {debounce}"))?;
    }
    if let Some(level) = env.log_level {
        config.logging.level = level;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.query.debounce(), Duration::from_millis(500));
        assert_eq!(config.query.flash(), Duration::from_millis(1000));
        assert_eq!(config.query.max_results, 100);
        assert_eq!(config.locator.panel_id, "xpath-helper-panel");
        assert_eq!(config.locator.reserved_class_prefixes, vec!["xpath-helper"]);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn embedded_defaults_match_code_defaults() {
        let embedded = Config::from_str(&DEFAULT_CONFIG).unwrap();
        assert_eq!(embedded, Config::default());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[query]
max_results = 25
[locator]
reserved_class_prefixes = ["my-overlay"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".xpath-helper"))?;
        fs::create_dir_all(workspace_dir.join(".git"))?;
        fs::write(
            workspace_dir.join(".xpath-helper/config.toml"),
            r#"
[query]
debounce_ms = 250
[logging]
format = "tree"
"#,
        )?;

        let global_path = Some(global);
        let workspace_path = Some(workspace_dir.join(".xpath-helper/config.toml"));

        let config =
            Config::load_with_layers(global_path, workspace_path, EnvOverrides::default())?;

        assert_eq!(config.query.max_results, 25);
        assert_eq!(config.query.debounce_ms, 250);
        assert_eq!(config.logging.format, LogFormat::Tree);
        assert!(config.locator.reserved_class_prefixes.contains(&"my-overlay".into()));
        assert!(config.locator.reserved_class_prefixes.contains(&"xpath-helper".into()));

        Ok(())
    }

    #[test]
    fn builtin_prefix_survives_override() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(&global, "[locator]\nreserved_class_prefixes = []\n")?;

        let config = Config::load_with_layers(Some(global), None, EnvOverrides::default())?;
        assert_eq!(config.locator.reserved_class_prefixes, vec!["xpath-helper"]);
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("120", "debug");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.query.debounce_ms, 120);
        assert_eq!(config.logging.level, "debug");
        Ok(())
    }

    #[test]
    fn malformed_env_override_is_an_error() {
        let overrides = EnvOverrides::for_tests("soon", "debug");
        assert!(Config::load_with_layers(None, None, overrides).is_err());
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }
}
