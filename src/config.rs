use crate::zodiac::{self, ZodiacSign};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_VERSION: &str = "v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "gemini_api_key")]
    pub api_key: String,
    pub sun_sign: String,
    pub moon_sign: String,
    pub rising_sign: String,
    pub api_base: String,
    pub api_version: String,
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sun_sign: String::new(),
            moon_sign: String::new(),
            rising_sign: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn sun_sign(&self) -> Option<ZodiacSign> {
        zodiac::parse_optional(&self.sun_sign)
    }

    pub fn moon_sign(&self) -> Option<ZodiacSign> {
        zodiac::parse_optional(&self.moon_sign)
    }

    pub fn rising_sign(&self) -> Option<ZodiacSign> {
        zodiac::parse_optional(&self.rising_sign)
    }
}

/// Which of the three personal placements a setter touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Sun,
    Moon,
    Rising,
}

pub fn app_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(".astrocast"))
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(app_dir()?.join("logs"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(app_dir()?.join("config.json"))
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "No settings file, using defaults");
        return Ok(Config::default());
    }
    let data = fs::read_to_string(path).context("read config.json")?;
    let config: Config = serde_json::from_str(&data).context("parse config.json")?;
    Ok(config)
}

pub fn save_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config directory")?;
    }
    let data = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, data).context("write config.json")?;
    Ok(())
}

/// Settings loaded once at startup; every setter writes straight back to disk.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    config: Config,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = load_from(&path)?;
        Ok(Self { path, config })
    }

    /// A store that starts from `config` without reading `path`.
    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_api_key(&mut self, api_key: &str) -> Result<()> {
        self.config.api_key = api_key.trim().to_string();
        self.persist()?;
        info!("API key updated");
        Ok(())
    }

    pub fn set_sign(&mut self, placement: Placement, sign: Option<ZodiacSign>) -> Result<()> {
        let value = sign.map(ZodiacSign::key).unwrap_or_default();
        info!(placement = ?placement, sign = %value, "Sign updated");
        match placement {
            Placement::Sun => self.config.sun_sign = value,
            Placement::Moon => self.config.moon_sign = value,
            Placement::Rising => self.config.rising_sign = value,
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        save_to(&self.path, &self.config)
    }
}
