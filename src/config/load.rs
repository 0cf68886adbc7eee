use super::{ConfigError, Settings, StatePaths};

/// Reads `config.yaml` under the state root (defaults when absent), applies
/// process env overrides and validates the result.
pub fn load_settings(paths: &StatePaths) -> Result<Settings, ConfigError> {
    load_settings_with_env(paths, |key| std::env::var(key).ok())
}

pub fn load_settings_with_env<F>(paths: &StatePaths, env: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let path = paths.settings_path();
    let mut settings = if path.exists() {
        Settings::from_path(&path)?
    } else {
        Settings::default()
    };
    settings.apply_env_overrides(env);
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MODEL;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn absent_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let settings =
            load_settings_with_env(&StatePaths::new(dir.path()), |_| None).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_values_are_overridden_by_env_then_validated() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.yaml"),
            "model: from-file\nrequest_timeout_secs: 30\n",
        )
        .expect("write");
        let settings = load_settings_with_env(&StatePaths::new(dir.path()), |key| {
            (key == ENV_MODEL).then(|| "from-env".to_string())
        })
        .expect("load");
        assert_eq!(settings.model, "from-env");
        assert_eq!(settings.request_timeout_secs, Some(30));
    }

    #[test]
    fn invalid_file_values_fail_validation() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("config.yaml"), "request_timeout_secs: 0\n").expect("write");
        let err = load_settings_with_env(&StatePaths::new(dir.path()), |_| None)
            .expect_err("invalid");
        assert!(matches!(err, ConfigError::Settings(_)));
    }
}
