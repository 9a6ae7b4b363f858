use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::store::StoreOptions;

const DEFAULT_PROMPT: &str = "> ";

#[derive(Debug, Clone)]
pub struct Config {
    pub reject_alphanumeric_only: bool,
    pub max_line_bytes: Option<usize>,
    pub show_guidance: bool,
    pub prompt: String,
    pub startup_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    reject_alphanumeric_only: Option<bool>,
    max_line_bytes: Option<usize>,
    show_guidance: Option<bool>,
    prompt: Option<String>,
    startup_file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub reject_alphanumeric_only: Option<bool>,
    pub max_line_bytes: Option<usize>,
    pub show_guidance: Option<bool>,
    pub startup_file: Option<PathBuf>,
}

impl Config {
    pub fn load(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<Self> {
        Self::load_with_env(config_path, overrides, |key| env::var(key).ok())
    }

    /// Same as [`Config::load`] with environment variables read through `lookup`.
    pub fn load_with_env<F>(
        config_path: Option<PathBuf>,
        overrides: ConfigOverrides,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_config = load_file_config(config_path.as_ref())?;

        let reject_alphanumeric_only = overrides
            .reject_alphanumeric_only
            .or(file_config.reject_alphanumeric_only)
            .or_else(|| env_value(&lookup, "WORDLIST_REJECT_ALPHANUMERIC", parse_flag))
            .unwrap_or(false);

        let max_line_bytes = overrides
            .max_line_bytes
            .or(file_config.max_line_bytes)
            .or_else(|| {
                env_value(&lookup, "WORDLIST_MAX_LINE_BYTES", |raw| {
                    raw.parse::<usize>().ok()
                })
            })
            .filter(|limit| *limit > 0);

        let show_guidance = overrides
            .show_guidance
            .or(file_config.show_guidance)
            .unwrap_or(true);

        let prompt = file_config
            .prompt
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        let startup_file = overrides
            .startup_file
            .or(file_config.startup_file)
            .or_else(|| lookup("WORDLIST_FILE").map(PathBuf::from))
            .filter(|path| !path.as_os_str().is_empty());

        Ok(Self {
            reject_alphanumeric_only,
            max_line_bytes,
            show_guidance,
            prompt,
            startup_file,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            reject_alphanumeric_only: self.reject_alphanumeric_only,
            max_line_bytes: self.max_line_bytes,
        }
    }
}

fn env_value<F, T>(lookup: &F, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let value = parse(raw.trim());
    if value.is_none() {
        tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
    }
    value
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, ignoring ASCII case.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn load_file_config(path: Option<&PathBuf>) -> Result<FileConfig> {
    if let Some(path) = path {
        if path.exists() {
            return read_config_from_path(path);
        }
        anyhow::bail!("config path {:?} does not exist", path);
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            tracing::debug!("Using config file {}", default_path.display());
            return read_config_from_path(&default_path);
        }
    }

    Ok(FileConfig::default())
}

fn read_config_from_path(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "wordlist-cli", "wordlist-cli")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_key: &str) -> Option<String> {
        None
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, body).expect("Failed to write config");
        path
    }

    #[test]
    fn file_values_are_applied() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            r#"
reject_alphanumeric_only = true
max_line_bytes = 255
show_guidance = false
prompt = "words> "
startup_file = "/tmp/words.txt"
"#,
        );

        let config = Config::load_with_env(Some(path), ConfigOverrides::default(), no_env).unwrap();
        assert!(config.reject_alphanumeric_only);
        assert_eq!(config.max_line_bytes, Some(255));
        assert!(!config.show_guidance);
        assert_eq!(config.prompt, "words> ");
        assert_eq!(config.startup_file, Some(PathBuf::from("/tmp/words.txt")));
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            "reject_alphanumeric_only = true\nmax_line_bytes = 255\nshow_guidance = true\n",
        );

        let overrides = ConfigOverrides {
            reject_alphanumeric_only: Some(false),
            max_line_bytes: Some(64),
            show_guidance: Some(false),
            startup_file: Some(PathBuf::from("cli.txt")),
        };
        let config = Config::load_with_env(Some(path), overrides, no_env).unwrap();
        assert!(!config.reject_alphanumeric_only);
        assert_eq!(config.max_line_bytes, Some(64));
        assert!(!config.show_guidance);
        assert_eq!(config.startup_file, Some(PathBuf::from("cli.txt")));
    }

    #[test]
    fn empty_file_falls_back_to_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&dir, "");

        let overrides = ConfigOverrides {
            reject_alphanumeric_only: Some(false),
            max_line_bytes: Some(0),
            ..ConfigOverrides::default()
        };
        let config = Config::load_with_env(Some(path), overrides, no_env).unwrap();
        assert_eq!(config.max_line_bytes, None);
        assert!(config.show_guidance);
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert_eq!(config.startup_file, None);
        assert_eq!(config.store_options(), StoreOptions::default());
    }

    fn fake_env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn environment_fills_unset_values() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&dir, "");
        let env = fake_env(&[
            ("WORDLIST_REJECT_ALPHANUMERIC", "yes"),
            ("WORDLIST_MAX_LINE_BYTES", " 128 "),
            ("WORDLIST_FILE", "/data/words.txt"),
        ]);

        let config = Config::load_with_env(Some(path), ConfigOverrides::default(), env).unwrap();
        assert!(config.reject_alphanumeric_only);
        assert_eq!(config.max_line_bytes, Some(128));
        assert_eq!(config.startup_file, Some(PathBuf::from("/data/words.txt")));
    }

    #[test]
    fn file_wins_over_environment() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(
            &dir,
            "reject_alphanumeric_only = false\nmax_line_bytes = 32\nstartup_file = \"file.txt\"\n",
        );
        let env = fake_env(&[
            ("WORDLIST_REJECT_ALPHANUMERIC", "1"),
            ("WORDLIST_MAX_LINE_BYTES", "999"),
            ("WORDLIST_FILE", "env.txt"),
        ]);

        let config = Config::load_with_env(Some(path), ConfigOverrides::default(), env).unwrap();
        assert!(!config.reject_alphanumeric_only);
        assert_eq!(config.max_line_bytes, Some(32));
        assert_eq!(config.startup_file, Some(PathBuf::from("file.txt")));
    }

    #[test]
    fn unparsable_environment_values_are_ignored() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&dir, "");
        let env = fake_env(&[
            ("WORDLIST_REJECT_ALPHANUMERIC", "maybe"),
            ("WORDLIST_MAX_LINE_BYTES", "-5"),
            ("WORDLIST_FILE", ""),
        ]);

        let config = Config::load_with_env(Some(path), ConfigOverrides::default(), env).unwrap();
        assert!(!config.reject_alphanumeric_only);
        assert_eq!(config.max_line_bytes, None);
        assert_eq!(config.startup_file, None);
    }

    #[test]
    fn flag_spellings() {
        for raw in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(parse_flag(raw), Some(true), "{raw}");
        }
        for raw in ["false", "0", "No", "off"] {
            assert_eq!(parse_flag(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_flag("2"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = Config::load(
            Some(dir.path().join("nope.toml")),
            ConfigOverrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_config(&dir, "reject_alphanumerics = true\n");
        let err = Config::load(Some(path), ConfigOverrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config file"));
    }
}
