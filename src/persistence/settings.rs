use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkSettings {
    // If None, use OS default state directory for the persisted walk
    #[serde(default)]
    pub storage_override: Option<PathBuf>,
    // If None, query logs go to OS temp dir
    #[serde(default)]
    pub query_log_override: Option<PathBuf>,
    #[serde(default)]
    pub query_log_enabled: bool,
    // Timeout for the walk builders (adjacency, prop/value counts, next labels)
    #[serde(default = "WalkSettings::default_walk_timeout_ms")]
    pub walk_timeout_ms: u64,
    // Timeout for the whole-graph label/type overview queries
    #[serde(default = "WalkSettings::default_overview_timeout_ms")]
    pub overview_timeout_ms: u64,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            storage_override: None,
            query_log_override: None,
            query_log_enabled: false,
            walk_timeout_ms: Self::default_walk_timeout_ms(),
            overview_timeout_ms: Self::default_overview_timeout_ms(),
        }
    }
}

impl WalkSettings {
    fn config_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Graph-Walk
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Graph-Walk");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Graph-Walk
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Graph-Walk");
            }
            return PathBuf::from("Graph-Walk");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Graph-Walk or ~/.config/Graph-Walk
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Graph-Walk");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Graph-Walk");
        }
    }

    fn storage_default_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            return Self::config_dir().join("State");
        }
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\Graph-Walk\State else TEMP
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join("Graph-Walk").join("State");
            }
            if let Ok(temp) = std::env::var("TEMP") {
                return PathBuf::from(temp).join("Graph-Walk");
            }
            return PathBuf::from("Graph-Walk");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_STATE_HOME/graph-walk or ~/.local/state/graph-walk, else /tmp/Graph-Walk
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("graph-walk");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("state").join("graph-walk");
            }
            return PathBuf::from("/tmp").join("Graph-Walk");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_dir().join("settings.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        let v: Self = serde_json::from_str(&s)?;
        Ok(v)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join("settings.json");
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    pub fn storage_dir(&self) -> PathBuf {
        if let Some(p) = &self.storage_override { return p.clone(); }
        Self::storage_default_dir()
    }

    /// Default query log directory when no override is set.
    /// Example: {temp_dir}/Graph-Walk/query-logs
    pub fn query_log_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push("Graph-Walk");
        p.push("query-logs");
        p
    }

    /// Query log directory, or None when logging to file is off.
    pub fn query_log_dir(&self) -> Option<PathBuf> {
        if !self.query_log_enabled { return None; }
        Some(self.query_log_override.clone().unwrap_or_else(Self::query_log_default_dir))
    }

    pub fn walk_timeout(&self) -> Duration { Duration::from_millis(self.walk_timeout_ms) }
    pub fn overview_timeout(&self) -> Duration { Duration::from_millis(self.overview_timeout_ms) }

    pub(crate) fn default_walk_timeout_ms() -> u64 { 30_000 }
    pub(crate) fn default_overview_timeout_ms() -> u64 { 3_000 }
}
