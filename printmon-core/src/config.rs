//! YAML settings.
//!
//! # Discovery order
//!
//! ```text
//! --config <path>                          (must exist)
//! ./printmon.yaml                          (if present)
//! <config_dir>/printmon/config.yaml        (if present)
//! built-in defaults
//! ```
//!
//! Every section and field is optional; a partial file overrides only what it
//! names. Settings are read-only, nothing is ever written back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::SummaryRules;
use crate::types::PrintParams;

pub const LOCAL_SETTINGS_FILE: &str = "printmon.yaml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// How the print server is launched and stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interpreter or runtime that executes the server entry point.
    pub interpreter: String,
    /// Entry point, relative to the launcher's working directory.
    pub script: PathBuf,
    /// Extra interpreter arguments placed before the script.
    pub args: Vec<String>,
    /// Extra environment for the child only.
    pub env: BTreeMap<String, String>,
    pub stop_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let interpreter = if cfg!(windows) { "python" } else { "python3" };
        Self {
            interpreter: interpreter.to_string(),
            script: PathBuf::from("printer_app.py"),
            args: Vec::new(),
            env: BTreeMap::from([("PYTHONUNBUFFERED".to_string(), "1".to_string())]),
            stop_timeout_secs: 5,
        }
    }
}

impl ServerSettings {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

/// Poll intervals of the log relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    /// Wait for a line while a process is live.
    pub drain_backoff_ms: u64,
    /// Liveness poll while no process is live.
    pub idle_poll_ms: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            drain_backoff_ms: 50,
            idle_poll_ms: 200,
        }
    }
}

impl RelaySettings {
    pub fn drain_backoff(&self) -> Duration {
        Duration::from_millis(self.drain_backoff_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

/// Where test calls go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ClientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Initial form values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    pub header: String,
    pub footer: String,
    pub code: String,
    pub services: String,
    pub created_date: String,
    pub qrcode: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            header: "Bem-vindo".to_string(),
            footer: "Obrigado".to_string(),
            code: "A123".to_string(),
            services: "Atendimento".to_string(),
            created_date: "2025-01-01".to_string(),
            qrcode: "https://exemplo.com".to_string(),
        }
    }
}

impl FormSettings {
    pub fn to_params(&self) -> PrintParams {
        PrintParams {
            header: self.header.clone(),
            footer: self.footer.clone(),
            code: self.code.clone(),
            services: self.services.clone(),
            created_date: self.created_date.clone(),
            qrcode: (!self.qrcode.is_empty()).then(|| self.qrcode.clone()),
        }
    }
}

pub type SummarySettings = SummaryRules;

/// Root of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub client: ClientSettings,
    pub form: FormSettings,
    pub summaries: SummarySettings,
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

impl Settings {
    /// Load settings from `path`.
    ///
    /// Returns `ConfigError::NotFound` if absent,
    /// `ConfigError::Parse` (with path + line context) if malformed YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve settings using the discovery order, rooted at `cwd`.
    ///
    /// Returns the settings and the file they came from (`None` for defaults).
    pub fn discover_at(
        explicit: Option<&Path>,
        cwd: &Path,
        config_dir: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let candidates = std::iter::once(cwd.join(LOCAL_SETTINGS_FILE))
            .chain(config_dir.map(|dir| dir.join("printmon").join("config.yaml")));
        for candidate in candidates {
            if candidate.is_file() {
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    /// `discover_at` convenience wrapper using the process cwd and the
    /// platform config directory.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::discover_at(explicit, &cwd, dirs::config_dir().as_deref())
    }
}
