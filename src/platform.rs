// docviewer platform paths
// Config: settings.json lives here.
// Data:   the session database lives here.

use std::env;
use std::path::PathBuf;

#[cfg_attr(any(target_os = "macos", target_os = "windows"), allow(dead_code))]
const APP_DIR_LINUX: &str = "docviewer";
#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR: &str = "DocViewer";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// XDG directory from `var`, or `$HOME/<fallback>`, joined with the app dir.
#[cfg_attr(any(target_os = "macos", target_os = "windows"), allow(dead_code))]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_DIR_LINUX),
        _ => fallback
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join(APP_DIR_LINUX),
    }
}

/// Returns the configuration directory.
///
/// - **Linux** (and other unix): `$XDG_CONFIG_HOME/docviewer` or `~/.config/docviewer`
/// - **macOS**: `~/Library/Application Support/DocViewer`
/// - **Windows**: `%APPDATA%/DocViewer`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir())
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
}

/// Returns the data directory.
///
/// - **Linux** (and other unix): `$XDG_DATA_HOME/docviewer` or `~/.local/share/docviewer`
/// - **macOS**: `~/Library/Application Support/DocViewer`
/// - **Windows**: `%LOCALAPPDATA%/DocViewer`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir())
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
}
