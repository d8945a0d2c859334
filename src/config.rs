use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_MODEL_PATH: &str = "models/yolov8n.onnx";
const DEFAULT_CADENCE_MS: u64 = 100;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;
// Monterrey city center; the default camera sites sit around it.
const DEFAULT_MAP_LATITUDE: f64 = 25.6866;
const DEFAULT_MAP_LONGITUDE: f64 = -100.3161;

#[derive(Debug, Deserialize, Default)]
struct ConsoleConfigFile {
    model_path: Option<String>,
    cadence_ms: Option<u64>,
    shutdown_timeout_secs: Option<u64>,
    categories: Option<Vec<String>>,
    sites: Option<Vec<CameraSite>>,
    map: Option<MapConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct MapConfigFile {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// A static, named camera location. Read-only during a session; consumed by
/// the map view for markers and by count-label resolution.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CameraSite {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "N/A".to_string()
}

#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub model_path: PathBuf,
    pub cadence: Duration,
    pub shutdown_timeout: Duration,
    pub categories: Vec<String>,
    pub sites: Vec<CameraSite>,
    pub map_center: (f64, f64),
}

impl ConsoleConfig {
    /// Load from the JSON file named by `CONSOLE_CONFIG` (if set), apply
    /// env overrides, validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CONSOLE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConsoleConfigFile) -> Self {
        Self {
            model_path: PathBuf::from(
                file.model_path
                    .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            ),
            cadence: Duration::from_millis(file.cadence_ms.unwrap_or(DEFAULT_CADENCE_MS)),
            shutdown_timeout: Duration::from_secs(
                file.shutdown_timeout_secs
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            ),
            categories: file.categories.unwrap_or_else(default_categories),
            sites: file.sites.unwrap_or_else(default_sites),
            map_center: (
                file.map
                    .as_ref()
                    .and_then(|map| map.latitude)
                    .unwrap_or(DEFAULT_MAP_LATITUDE),
                file.map
                    .and_then(|map| map.longitude)
                    .unwrap_or(DEFAULT_MAP_LONGITUDE),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("CONSOLE_MODEL") {
            if !path.trim().is_empty() {
                self.model_path = PathBuf::from(path);
            }
        }
        if let Ok(cadence) = std::env::var("CONSOLE_CADENCE_MS") {
            let ms: u64 = cadence
                .parse()
                .map_err(|_| anyhow!("CONSOLE_CADENCE_MS must be an integer number of ms"))?;
            self.cadence = Duration::from_millis(ms);
        }
        if let Ok(timeout) = std::env::var("CONSOLE_SHUTDOWN_TIMEOUT_SECS") {
            let seconds: u64 = timeout.parse().map_err(|_| {
                anyhow!("CONSOLE_SHUTDOWN_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.shutdown_timeout = Duration::from_secs(seconds);
        }
        if let Ok(categories) = std::env::var("CONSOLE_CATEGORIES") {
            let parsed = split_csv(&categories);
            if !parsed.is_empty() {
                self.categories = parsed;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cadence.is_zero() {
            return Err(anyhow!("cadence must be greater than zero"));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(anyhow!("shutdown timeout must be greater than zero"));
        }
        if self.categories.is_empty() {
            return Err(anyhow!("at least one count category must be configured"));
        }
        if self.sites.is_empty() {
            return Err(anyhow!("at least one camera site must be configured"));
        }
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(anyhow!("camera site names must not be empty"));
            }
            if !(-90.0..=90.0).contains(&site.latitude)
                || !(-180.0..=180.0).contains(&site.longitude)
            {
                return Err(anyhow!(
                    "camera site '{}' has out-of-range coordinates",
                    site.name
                ));
            }
        }
        let mut names: Vec<&str> = self.sites.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.sites.len() {
            return Err(anyhow!("camera site names must be unique"));
        }
        Ok(())
    }
}

/// The COCO subset the original deployment counts.
pub fn default_categories() -> Vec<String> {
    ["person", "bicycle", "car", "motorcycle", "bus", "truck"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// Built-in camera sites around Monterrey.
pub fn default_sites() -> Vec<CameraSite> {
    vec![
        CameraSite {
            name: "Camara Av. Revolucion 1".to_string(),
            latitude: 25.6503,
            longitude: -100.2920,
            direction: "North-South".to_string(),
        },
        CameraSite {
            name: "Av. Revolucion 2".to_string(),
            latitude: 25.6601,
            longitude: -100.2958,
            direction: "South-North".to_string(),
        },
        CameraSite {
            name: "Av. Luis Elizondo".to_string(),
            latitude: 25.6514,
            longitude: -100.2892,
            direction: "East-West".to_string(),
        },
    ]
}

fn read_config_file(path: &Path) -> Result<ConsoleConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
