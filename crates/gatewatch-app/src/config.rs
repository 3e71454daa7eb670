//! Configuration management for gatewatch
//!
//! Config stored at: ~/.config/gatewatch/config.json

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gatewatch_types::{ConfigError, OutputFormat, Result};
use gatewatch_vision::{LocatorConfig, ReaderConfig};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Vehicle registry file (.toml or .csv)
    #[serde(default)]
    pub registry_path: Option<PathBuf>,

    /// Directory holding access_log.json
    #[serde(default)]
    pub ledger_dir: Option<PathBuf>,

    /// External OCR command; the crop path is appended as `--image <path>`
    #[serde(default)]
    pub ocr_command: Option<String>,

    #[serde(default = "default_min_plate_area")]
    pub min_plate_area: f64,

    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    #[serde(default = "default_approx_epsilon_ratio")]
    pub approx_epsilon_ratio: f64,

    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,

    #[serde(default = "default_canny_low")]
    pub canny_low: f32,

    #[serde(default = "default_canny_high")]
    pub canny_high: f32,

    #[serde(default = "default_upscale")]
    pub upscale: u32,

    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Debounce window in seconds
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Seconds a plate must go unseen before its UNKNOWN/BLOCKED alert repeats
    #[serde(default = "default_alert_quiet_secs")]
    pub alert_quiet_secs: u64,

    /// Polling tick in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Recognition workers for the concurrent loop (0 = CPU count)
    #[serde(default)]
    pub workers: usize,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
}

fn default_min_plate_area() -> f64 {
    300.0
}

fn default_max_candidates() -> usize {
    10
}

fn default_approx_epsilon_ratio() -> f64 {
    0.02
}

fn default_blur_sigma() -> f32 {
    1.1
}

fn default_canny_low() -> f32 {
    30.0
}

fn default_canny_high() -> f32 {
    200.0
}

fn default_upscale() -> u32 {
    3
}

fn default_min_text_len() -> usize {
    7
}

fn default_min_confidence() -> f32 {
    0.4
}

fn default_debounce_secs() -> u64 {
    5
}

fn default_alert_quiet_secs() -> u64 {
    30
}

fn default_tick_ms() -> u64 {
    15
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_path: None,
            ledger_dir: None,
            ocr_command: None,
            min_plate_area: default_min_plate_area(),
            max_candidates: default_max_candidates(),
            approx_epsilon_ratio: default_approx_epsilon_ratio(),
            blur_sigma: default_blur_sigma(),
            canny_low: default_canny_low(),
            canny_high: default_canny_high(),
            upscale: default_upscale(),
            min_text_len: default_min_text_len(),
            min_confidence: default_min_confidence(),
            debounce_secs: default_debounce_secs(),
            alert_quiet_secs: default_alert_quiet_secs(),
            tick_ms: default_tick_ms(),
            workers: 0,
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("gatewatch");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("gatewatch");
        Ok(data_dir)
    }

    /// Registry file, defaulting to vehicles.toml in the data directory
    pub fn registry_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.registry_path {
            return Ok(path.clone());
        }
        Ok(Self::data_dir()?.join("vehicles.toml"))
    }

    /// Ledger directory, defaulting to the data directory
    pub fn ledger_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.ledger_dir {
            return Ok(dir.clone());
        }
        Self::data_dir()
    }

    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            min_area: self.min_plate_area,
            max_candidates: self.max_candidates,
            epsilon_ratio: self.approx_epsilon_ratio,
            blur_sigma: self.blur_sigma,
            canny_low: self.canny_low,
            canny_high: self.canny_high,
        }
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            min_text_len: self.min_text_len,
            min_confidence: self.min_confidence,
            upscale: self.upscale,
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn alert_quiet(&self) -> Duration {
        Duration::from_secs(self.alert_quiet_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Worker count with 0 resolved to the number of CPUs
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    /// Reject settings the vision stages cannot work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(ConfigError::Invalid(msg).into()) };

        if self.blur_sigma.is_nan() || self.blur_sigma <= 0.0 {
            return invalid(format!("blur_sigma must be positive, got {}", self.blur_sigma));
        }
        if self.upscale == 0 || self.upscale > ReaderConfig::MAX_UPSCALE {
            return invalid(format!(
                "upscale must be within 1..={}, got {}",
                ReaderConfig::MAX_UPSCALE,
                self.upscale
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return invalid(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            ));
        }
        if !(0.0..=1.0).contains(&self.approx_epsilon_ratio) {
            return invalid(format!(
                "approx_epsilon_ratio must be within [0, 1], got {}",
                self.approx_epsilon_ratio
            ));
        }
        if self.min_plate_area.is_nan() || self.min_plate_area < 0.0 {
            return invalid(format!(
                "min_plate_area must not be negative, got {}",
                self.min_plate_area
            ));
        }
        if self.canny_low.is_nan()
            || self.canny_high.is_nan()
            || self.canny_low < 0.0
            || self.canny_high < self.canny_low
        {
            return invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                self.canny_low, self.canny_high
            ));
        }
        if self.max_candidates == 0 {
            return invalid("max_candidates must be at least 1".to_string());
        }
        if self.tick_ms == 0 {
            return invalid("tick_ms must be at least 1".to_string());
        }
        Ok(())
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show_path = |p: Result<PathBuf>| {
            p.map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        };

        writeln!(f, "Gatewatch Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Registry:        {}", show_path(self.registry_path()))?;
        writeln!(f, "Ledger dir:      {}", show_path(self.ledger_dir()))?;
        writeln!(
            f,
            "OCR command:     {}",
            self.ocr_command.as_deref().unwrap_or("(not set)")
        )?;
        writeln!(f, "Min plate area:  {}", self.min_plate_area)?;
        writeln!(f, "Max candidates:  {}", self.max_candidates)?;
        writeln!(f, "Approx epsilon:  {}", self.approx_epsilon_ratio)?;
        writeln!(f, "Blur sigma:      {}", self.blur_sigma)?;
        writeln!(f, "Canny:           {} / {}", self.canny_low, self.canny_high)?;
        writeln!(f, "Upscale:         {}x", self.upscale)?;
        writeln!(f, "Min text length: {}", self.min_text_len)?;
        writeln!(f, "Min confidence:  {}", self.min_confidence)?;
        writeln!(f, "Debounce:        {}s", self.debounce_secs)?;
        writeln!(f, "Alert quiet:     {}s", self.alert_quiet_secs)?;
        writeln!(f, "Tick:            {}ms", self.tick_ms)?;
        if self.workers == 0 {
            writeln!(f, "Workers:         auto ({})", self.worker_count())?;
        } else {
            writeln!(f, "Workers:         {}", self.workers)?;
        }
        writeln!(f, "Output format:   {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:     {}", path.display())?;
        }

        Ok(())
    }
}
