//! User settings stored as settings.json in the app data directory

use crate::constants::*;
use crate::error::ConfigError;
use crate::machine::RetryPolicy;
use crate::render::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Localized field labels for the investment cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Translations {
    pub expected_roi: String,
    pub minimum_amount: String,
    pub maximum_amount: String,
    pub round_duration: String,
    pub months: String,
}

impl Default for Translations {
    fn default() -> Self {
        Self {
            expected_roi: "Expected ROI".to_string(),
            minimum_amount: "Minimum Amount".to_string(),
            maximum_amount: "Maximum Amount".to_string(),
            round_duration: "Round Duration".to_string(),
            months: "Months".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Endpoint
    pub base_url: String,
    pub endpoint: String,
    pub csrf_token: Option<String>,

    // Retry policy
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub min_display_ms: u64,
    pub timeout_ms: u64,

    // Presentation
    pub skeleton_count: usize,
    pub stagger_delay_ms: u64,
    pub description_limit: usize,
    pub site_origin: Option<String>,
    pub translations: Translations,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            csrf_token: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            min_display_ms: DEFAULT_MIN_DISPLAY_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            skeleton_count: DEFAULT_SKELETON_COUNT,
            stagger_delay_ms: DEFAULT_STAGGER_DELAY_MS,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            site_origin: None,
            translations: Translations::default(),
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("settings.json");
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), ConfigError> {
        let path = data_dir.join("settings.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Full request URL; the endpoint may be absolute or relative to `base_url`
    pub fn endpoint_url(&self) -> Result<String, ConfigError> {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            return Ok(self.endpoint.clone());
        }
        let base = self.base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }
        Ok(format!("{}/{}", base, self.endpoint.trim_start_matches('/')))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            min_display: Duration::from_millis(self.min_display_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            translations: self.translations.clone(),
            skeleton_count: self.skeleton_count,
            stagger_delay_ms: self.stagger_delay_ms,
            description_limit: self.description_limit,
            site_origin: self
                .site_origin
                .clone()
                .unwrap_or_else(|| self.base_url.trim_end_matches('/').to_string()),
        }
    }
}

/// Default app data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
