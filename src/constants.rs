//! Application constants and configuration

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DIR_NAME: &str = "Investments Loader";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ENDPOINT: &str = "/api/investments/by-category";
pub const FLAG_CDN_URL: &str = "https://flagcdn.com";

/// Query value sent when no specific category is selected
pub const ALL_CATEGORIES: &str = "all";

// Loader policy defaults (milliseconds)
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;
pub const DEFAULT_MIN_DISPLAY_MS: u64 = 600;
pub const DEFAULT_TIMEOUT_MS: u64 = 15000;

// Presentation defaults
pub const DEFAULT_SKELETON_COUNT: usize = 6;
pub const DEFAULT_STAGGER_DELAY_MS: u64 = 80;
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 150;
pub const DEFAULT_COUNTRY_CODE: &str = "sa";
