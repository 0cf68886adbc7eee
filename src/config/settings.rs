use super::{ConfigError, StatePaths};
use crate::language::Language;
use crate::refine::gemini::{DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};
use crate::refine::GeminiOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const ENV_API_BASE: &str = "PERFECTER_API_BASE";
pub const ENV_MODEL: &str = "PERFECTER_MODEL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api_base: String,
    pub model: String,
    /// Env var holding the provider API key. The key itself is never
    /// written to the settings file.
    pub api_key_env: String,
    pub default_language: Language,
    pub request_timeout_secs: Option<u64>,
    pub history_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            default_language: Language::English,
            request_timeout_secs: None,
            history_dir: None,
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_base) = env(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            self.api_base = api_base.trim().to_string();
        }
        if let Some(model) = env(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Settings("`api_base` must be non-empty".to_string()));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ConfigError::Settings(format!(
                "`api_base` must be an http(s) url, got `{}`",
                self.api_base
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Settings("`model` must be non-empty".to_string()));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`api_key_env` must be non-empty".to_string(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Settings(
                "`request_timeout_secs` must be greater than zero".to_string(),
            ));
        }
        if let Some(dir) = &self.history_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Settings(
                    "`history_dir` must be an absolute path".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn store_dir(&self, paths: &StatePaths) -> PathBuf {
        self.history_dir
            .clone()
            .unwrap_or_else(|| paths.default_store_dir())
    }

    pub fn gemini_options<F>(&self, env: F) -> GeminiOptions
    where
        F: Fn(&str) -> Option<String>,
    {
        GeminiOptions {
            api_base: self.api_base.clone(),
            model: self.model.clone(),
            api_key: env(&self.api_key_env).filter(|v| !v.trim().is_empty()),
            api_key_env: self.api_key_env.clone(),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_yaml::from_str("model: gemini-pro\n").expect("parse");
        assert_eq!(settings.model, "gemini-pro");
        assert_eq!(settings.api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(settings.api_key_env, DEFAULT_API_KEY_ENV);
        assert_eq!(settings.default_language, Language::English);
        settings.validate().expect("valid");
    }

    #[test]
    fn default_language_parses_from_yaml() {
        let settings: Settings =
            serde_yaml::from_str("default_language: Bangla\n").expect("parse");
        assert_eq!(settings.default_language, Language::Bangla);
    }

    #[test]
    fn from_path_reports_invalid_yaml_with_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        fs::write(&path, "model: [unclosed").expect("write");
        let err = Settings::from_path(&path).expect_err("invalid");
        assert!(err.to_string().contains("config.yaml"), "{err}");
    }

    #[test]
    fn env_overrides_replace_base_and_model() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(env_from(&[
            (ENV_API_BASE, "http://127.0.0.1:9999"),
            (ENV_MODEL, " gemini-test "),
        ]));
        assert_eq!(settings.api_base, "http://127.0.0.1:9999");
        assert_eq!(settings.model, "gemini-test");

        settings.apply_env_overrides(env_from(&[(ENV_MODEL, "  ")]));
        assert_eq!(settings.model, "gemini-test");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases = [
            Settings {
                api_base: "  ".to_string(),
                ..Settings::default()
            },
            Settings {
                api_base: "ftp://example.com".to_string(),
                ..Settings::default()
            },
            Settings {
                model: String::new(),
                ..Settings::default()
            },
            Settings {
                request_timeout_secs: Some(0),
                ..Settings::default()
            },
            Settings {
                history_dir: Some(PathBuf::from("relative/dir")),
                ..Settings::default()
            },
        ];
        for settings in cases {
            assert!(settings.validate().is_err(), "accepted {settings:?}");
        }
    }

    #[test]
    fn gemini_options_read_key_from_named_env_var() {
        let settings = Settings {
            api_key_env: "MY_KEY".to_string(),
            request_timeout_secs: Some(15),
            ..Settings::default()
        };
        let options = settings.gemini_options(env_from(&[("MY_KEY", "secret")]));
        assert_eq!(options.api_key.as_deref(), Some("secret"));
        assert_eq!(options.api_key_env, "MY_KEY");
        assert_eq!(options.timeout, Some(Duration::from_secs(15)));

        let options = settings.gemini_options(env_from(&[]));
        assert_eq!(options.api_key, None);
    }

    #[test]
    fn store_dir_prefers_configured_history_dir() {
        let paths = StatePaths::new(Path::new("/home/u/.perfecter"));
        assert_eq!(
            Settings::default().store_dir(&paths),
            PathBuf::from("/home/u/.perfecter/store")
        );
        let settings = Settings {
            history_dir: Some(PathBuf::from("/data/history")),
            ..Settings::default()
        };
        assert_eq!(settings.store_dir(&paths), PathBuf::from("/data/history"));
    }
}
