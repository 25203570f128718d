use crate::assets::AssetLoader;
use point_ops::WorkingResolution;
use serde::Deserialize;
use std::time::Duration;

use super::OperatorSelection;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub arithmetic: ArithmeticConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub gamma: GammaRange,

    #[serde(default)]
    pub rendering: RenderingConfig,

    #[serde(default)]
    pub surfaces: SurfaceConfig,

    /// Images used when a request omits its source(s)
    #[serde(default)]
    pub defaults: DefaultImages,
}

/// Single-image pipeline settings
#[derive(Debug, Deserialize, Clone)]
pub struct TransformConfig {
    /// Working width cap; height follows the aspect ratio
    #[serde(default = "default_max_width")]
    pub max_width: u32,
}

fn default_max_width() -> u32 {
    500
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
        }
    }
}

/// Two-image pipeline settings
#[derive(Debug, Deserialize, Clone)]
pub struct ArithmeticConfig {
    #[serde(default = "default_arithmetic_width")]
    pub width: u32,
    #[serde(default = "default_arithmetic_height")]
    pub height: u32,
}

fn default_arithmetic_width() -> u32 {
    400
}

fn default_arithmetic_height() -> u32 {
    300
}

impl Default for ArithmeticConfig {
    fn default() -> Self {
        Self {
            width: default_arithmetic_width(),
            height: default_arithmetic_height(),
        }
    }
}

/// Remote image fetch settings
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    /// Largest accepted payload, for both fetched and inline images
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Request timeout; no timeout when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_user_agent() -> String {
    format!("pointlab/{}", env!("CARGO_PKG_VERSION"))
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Range offered by the gamma slider.
///
/// The API accepts any finite gamma above zero; values outside this range
/// are only logged.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct GammaRange {
    #[serde(default = "default_gamma_min")]
    pub min: f64,
    #[serde(default = "default_gamma_max")]
    pub max: f64,
    #[serde(default = "default_gamma_step")]
    pub step: f64,
}

fn default_gamma_min() -> f64 {
    0.1
}

fn default_gamma_max() -> f64 {
    3.0
}

fn default_gamma_step() -> f64 {
    0.1
}

impl GammaRange {
    pub fn contains(&self, gamma: f64) -> bool {
        gamma >= self.min && gamma <= self.max
    }
}

impl Default for GammaRange {
    fn default() -> Self {
        Self {
            min: default_gamma_min(),
            max: default_gamma_max(),
            step: default_gamma_step(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RenderingConfig {
    /// Re-compress output PNGs with oxipng (smaller, slower)
    #[serde(default)]
    pub optimize_png: bool,
}

/// Render surface settings
#[derive(Debug, Deserialize, Clone)]
pub struct SurfaceConfig {
    /// Idle surfaces beyond this count are evicted, least recently used first
    #[serde(default = "default_max_surfaces")]
    pub max_count: usize,
}

fn default_max_surfaces() -> usize {
    64
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_surfaces(),
        }
    }
}

/// Default image URLs per operator
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DefaultImages {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub inversion: Option<String>,
    #[serde(default)]
    pub gamma: Option<String>,
    /// The two arithmetic operands, in order
    #[serde(default)]
    pub arithmetic: Vec<String>,
}

impl DefaultImages {
    /// Default source for a single-image operator
    pub fn for_operator(&self, operator: &OperatorSelection) -> Option<&str> {
        match operator {
            OperatorSelection::Identity => self.identity.as_deref(),
            OperatorSelection::Inversion => self.inversion.as_deref(),
            OperatorSelection::Gamma { .. } => self.gamma.as_deref(),
            OperatorSelection::Add | OperatorSelection::Subtract => None,
        }
    }

    /// Default source for arithmetic slot `index` (0 or 1)
    pub fn arithmetic_slot(&self, index: usize) -> Option<&str> {
        self.arithmetic.get(index).map(String::as_str)
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    let config: Self = config;
                    tracing::info!(
                        max_width = config.transform.max_width,
                        arithmetic_width = config.arithmetic.width,
                        arithmetic_height = config.arithmetic.height,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Working resolution of the single-image pipeline
    pub fn transform_resolution(&self) -> WorkingResolution {
        WorkingResolution::FitWidth {
            max_width: self.transform.max_width,
        }
    }

    /// Working resolution shared by both arithmetic operands
    pub fn arithmetic_resolution(&self) -> WorkingResolution {
        WorkingResolution::Exact {
            width: self.arithmetic.width,
            height: self.arithmetic.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.transform.max_width, 500);
        assert_eq!(config.arithmetic.width, 400);
        assert_eq!(config.arithmetic.height, 300);
        assert_eq!(config.fetch.max_bytes, 20 * 1024 * 1024);
        assert!(config.fetch.timeout().is_none());
        assert!(!config.rendering.optimize_png);
        assert_eq!(config.surfaces.max_count, 64);
        assert_eq!(config.gamma, GammaRange::default());
    }

    #[test]
    fn test_resolutions() {
        let config = AppConfig::default();
        assert_eq!(
            config.transform_resolution(),
            WorkingResolution::FitWidth { max_width: 500 }
        );
        assert_eq!(
            config.arithmetic_resolution(),
            WorkingResolution::Exact {
                width: 400,
                height: 300
            }
        );
    }

    #[test]
    fn test_deserialize_partial_config() {
        let yaml = r#"
transform:
  max_width: 640
fetch:
  timeout_secs: 5
surfaces:
  max_count: 8
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.transform.max_width, 640);
        assert_eq!(config.arithmetic.width, 400);
        assert_eq!(config.fetch.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.surfaces.max_count, 8);
        assert!(config.defaults.arithmetic.is_empty());
    }

    #[test]
    fn test_embedded_config_parses() {
        let config = AppConfig::load_from_assets(&AssetLoader::new(None));

        assert_eq!(config.transform.max_width, 500);
        assert_eq!(config.defaults.arithmetic.len(), 2);
        assert!(config
            .defaults
            .for_operator(&OperatorSelection::Gamma { gamma: 1.0 })
            .is_some());
        assert!(config.defaults.for_operator(&OperatorSelection::Add).is_none());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "transform: [not, a, map]").unwrap();

        let config = AppConfig::load_from_assets(&AssetLoader::new(Some(path)));
        assert_eq!(config.transform.max_width, 500);
        assert!(config.defaults.identity.is_none());
    }

    #[test]
    fn test_gamma_range_contains() {
        let range = GammaRange::default();
        assert!(range.contains(0.1));
        assert!(range.contains(3.0));
        assert!(!range.contains(3.5));
        assert!(!range.contains(0.05));
    }
}
