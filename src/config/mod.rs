pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_settings, load_settings_with_env};
pub use paths::{StatePaths, GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR};
pub use settings::{Settings, DEFAULT_API_KEY_ENV, ENV_API_BASE, ENV_MODEL};
