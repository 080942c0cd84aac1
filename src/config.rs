//! Persisted application settings.
//!
//! Stored as pretty JSON at `<config dir>/flow-canvas/settings.json`.
//! `FLOW_CANVAS_BACKEND_URL` overrides the saved backend address.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BACKEND_URL_ENV: &str = "FLOW_CANVAS_BACKEND_URL";
const APP_DIR: &str = "flow-canvas";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub snap_radius: f32,
    pub edge_hit_width: f32,
    pub history_max_records: usize,
    pub graphs_dir: PathBuf,
    pub last_graph: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 300,
            snap_radius: crate::editor::SNAP_RADIUS,
            edge_hit_width: crate::editor::EDGE_HIT_WIDTH,
            history_max_records: 200,
            graphs_dir: PathBuf::from("graphs"),
            last_graph: None,
        }
    }
}

impl Settings {
    /// Default location of the settings file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Reads settings from `path`. A missing or malformed file yields the
    /// defaults (logged), then the environment override is applied.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let mut settings = match path.map(Self::read) {
            Some(Ok(settings)) => settings,
            Some(Err(e)) => {
                log::warn!("Using default settings: {:#}", e);
                Self::default()
            }
            None => Self::default(),
        };
        settings.apply_env();
        settings
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend_url = url.trim().to_string();
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Path of a saved graph by file name, `.json` appended if missing.
    pub fn graph_path(&self, name: &str) -> PathBuf {
        let name = name.trim();
        if name.ends_with(".json") {
            self.graphs_dir.join(name)
        } else {
            self.graphs_dir.join(format!("{name}.json"))
        }
    }
}
