use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, filter::SearchFilterConfig, structs::flags::StatusFlags};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pacman: String,
    pub db_path: PathBuf,
    /// Program and arguments printing `name old -> new` lines.
    pub update_command: Vec<String>,
    /// Exit code the update command uses for "nothing to update".
    pub no_updates_exit_code: i32,
    pub timeout_secs: u64,
    pub size_decimals: u8,
    pub default_status: StatusFlags,
    pub search: SearchFilterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacman: "pacman".to_string(),
            db_path: PathBuf::from("/var/lib/pacman"),
            update_command: vec!["checkupdates".to_string()],
            no_updates_exit_code: 2,
            timeout_secs: 30,
            size_decimals: 1,
            default_status: StatusFlags::ALL,
            search: SearchFilterConfig::default(),
        }
    }
}

impl Config {
    /// `~/.config/pkgview/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pkgview")
            .join("config.json")
    }

    /// Load from `path`, or the default location. A missing file gives the
    /// defaults; a file that doesn't parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
