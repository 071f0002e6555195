// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the BRANDLOOP_HOME environment variable for isolation.
// When BRANDLOOP_HOME is set, config and data live under that directory.
// When unset, config uses ~/.brandloop/ and data uses XDG_DATA_HOME/brandloop.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the BRANDLOOP_HOME override, if set.
fn brandloop_home() -> Option<PathBuf> {
    std::env::var_os("BRANDLOOP_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory on exotic systems.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $BRANDLOOP_HOME/ or ~/.brandloop/
pub fn config_dir() -> PathBuf {
    if let Some(home) = brandloop_home() {
        return home;
    }
    dirs_home().join(".brandloop")
}

/// Data directory: $BRANDLOOP_HOME/data/ or ~/.local/share/brandloop/
pub fn data_dir() -> PathBuf {
    if let Some(home) = brandloop_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "brandloop")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Default session directory (one JSON file per session)
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
