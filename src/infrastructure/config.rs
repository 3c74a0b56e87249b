use crate::domain::annotation::GlucoseThresholds;
use crate::domain::color::{default_palette, Color};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub charts: ChartsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartsConfig {
    #[serde(default = "default_window_minutes")]
    pub postprandial_window_minutes: f64,
    #[serde(default = "default_very_low")]
    pub very_low_mg_dl: f64,
    #[serde(default = "default_hypoglycemia")]
    pub hypoglycemia_mg_dl: f64,
    #[serde(default = "default_hyperglycemia")]
    pub hyperglycemia_mg_dl: f64,
    #[serde(default = "default_very_high")]
    pub very_high_mg_dl: f64,
    #[serde(default = "default_palette")]
    pub palette: Vec<Color>,
    /// Seed for random series colors; unset means a fresh seed per request.
    #[serde(default)]
    pub color_seed: Option<u64>,
}

impl ChartsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let window = self.postprandial_window_minutes;
        anyhow::ensure!(
            window.is_finite() && window > 0.0,
            "charts.postprandial_window_minutes must be a positive number, got {}",
            window
        );
        Ok(())
    }

    pub fn thresholds(&self) -> GlucoseThresholds {
        GlucoseThresholds {
            very_low: self.very_low_mg_dl,
            hypoglycemia: self.hypoglycemia_mg_dl,
            hyperglycemia: self.hyperglycemia_mg_dl,
            very_high: self.very_high_mg_dl,
        }
    }
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            postprandial_window_minutes: default_window_minutes(),
            very_low_mg_dl: default_very_low(),
            hypoglycemia_mg_dl: default_hypoglycemia(),
            hyperglycemia_mg_dl: default_hyperglycemia(),
            very_high_mg_dl: default_very_high(),
            palette: default_palette(),
            color_seed: None,
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_window_minutes() -> f64 {
    120.0
}

fn default_very_low() -> f64 {
    GlucoseThresholds::default().very_low
}

fn default_very_high() -> f64 {
    GlucoseThresholds::default().very_high
}

fn default_hypoglycemia() -> f64 {
    GlucoseThresholds::default().hypoglycemia
}

fn default_hyperglycemia() -> f64 {
    GlucoseThresholds::default().hyperglycemia
}

/// `config/dashboard.{toml,yaml,json}` (optional) overlaid by
/// `DASHBOARD__SECTION__KEY` environment variables.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.charts.validate()?;
    Ok(config)
}
