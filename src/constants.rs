// Timing and provider constants. Credentials are read from the environment.

use std::env;
use std::time::Duration;

/// Port the relay endpoint listens on unless overridden.
pub const DEFAULT_PORT: u16 = 4321;
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:4321";
pub const CHAT_ENDPOINT: &str = "/api/chat";

// Provider parameters
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 500;

/// Upper bound on a single relay round trip before it is treated as failed.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Placeholder animation
pub const PLACEHOLDER_START_DELAY: Duration = Duration::from_millis(100);
pub const PLACEHOLDER_TYPE_INTERVAL: Duration = Duration::from_millis(120);
pub const PLACEHOLDER_HOLD_DELAY: Duration = Duration::from_millis(1500);
pub const PLACEHOLDER_DELETE_INTERVAL: Duration = Duration::from_millis(80);
pub const PLACEHOLDER_ADVANCE_DELAY: Duration = Duration::from_millis(400);

/// Granularity of the view loop; every animation delay is a multiple of it.
pub const VIEW_TICK: Duration = Duration::from_millis(20);

pub const LOG_FILE: &str = "termfolio.log";

lazy_static::lazy_static! {
    pub static ref OPENAI_API_KEY: String = env::var("OPENAI_API_KEY").unwrap_or_default();
    pub static ref OPENAI_BASE_URL: String =
        env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
}
