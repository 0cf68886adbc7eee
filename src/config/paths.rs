use crate::config::ConfigError;
use std::path::{Path, PathBuf};

pub const GLOBAL_STATE_DIR: &str = ".perfecter";
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "config.yaml";
pub const STORE_DIR_NAME: &str = "store";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub root: PathBuf,
}

impl StatePaths {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn from_home() -> Result<Self, ConfigError> {
        let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
        Ok(Self::new(&PathBuf::from(home).join(GLOBAL_STATE_DIR)))
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(GLOBAL_SETTINGS_FILE_NAME)
    }

    pub fn default_store_dir(&self) -> PathBuf {
        self.root.join(STORE_DIR_NAME)
    }

    pub fn event_log_path(&self) -> PathBuf {
        crate::shared::logging::event_log_path(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::StatePaths;
    use std::path::PathBuf;

    #[test]
    fn state_paths_hang_off_the_root() {
        let paths = StatePaths::new(&PathBuf::from("/home/u/.perfecter"));
        assert_eq!(
            paths.settings_path(),
            PathBuf::from("/home/u/.perfecter/config.yaml")
        );
        assert_eq!(
            paths.default_store_dir(),
            PathBuf::from("/home/u/.perfecter/store")
        );
        assert_eq!(
            paths.event_log_path(),
            PathBuf::from("/home/u/.perfecter/logs/events.log")
        );
    }
}
