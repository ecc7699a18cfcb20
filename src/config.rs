use std::env;
use std::path::PathBuf;

/// Runtime configuration, read from the environment with local-dev defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the sqlite database.
    pub data_dir: PathBuf,
    /// Drop folder scanned for settlement files, one subfolder per brand.
    pub settlement_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = env::var("BRANDPULSE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let settlement_dir = env::var("BRANDPULSE_SETTLEMENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("settlements"));
        Config {
            data_dir,
            settlement_dir,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("brandpulse.sqlite")
    }
}
