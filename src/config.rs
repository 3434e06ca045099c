use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::models::CurrentUser;
use crate::session::Session;
use crate::{Error, Result};

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<CurrentUser>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            user: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("tradehub.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "tradehub", "TradeHubGTK")?;
        Some(proj.data_dir().to_path_buf())
    }

    /// Loads the settings file, falling back to defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "No config dir"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn session(&self) -> Option<Session> {
        if self.base_url.is_empty() {
            return None;
        }
        match (&self.token, &self.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some(Session {
                base_url: self.base_url.clone(),
                token: token.clone(),
                user: user.clone(),
            }),
            _ => None,
        }
    }

    pub fn remember(&mut self, session: &Session) {
        self.base_url = session.base_url.clone();
        self.token = Some(session.token.clone());
        self.user = Some(session.user.clone());
    }

    pub fn forget_session(&mut self) {
        self.token = None;
        self.user = None;
    }
}

pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim().trim_end_matches('/');
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    url::Url::parse(&candidate)?;
    Ok(candidate)
}
