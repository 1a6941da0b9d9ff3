use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "tasbeeh";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/tasbeeh`, or the platform data-local dir when HOME is unset
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("tasbeeh_config.json"))
    }

    pub fn session_json_path() -> PathBuf {
        Self::state_file("session.json")
    }

    pub fn session_db_path() -> PathBuf {
        Self::state_file("session.db")
    }

    pub fn log_path() -> PathBuf {
        Self::state_file("tasbeeh.log")
    }

    fn state_file(name: &str) -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|| PathBuf::from(format!("tasbeeh_{name}")))
    }
}
