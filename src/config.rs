use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;
use crate::services::session::ChatTiming;

const DEFAULT_WELCOME: &str =
    "Hi there! 👋 I'm the Brightpath assistant. Ask me about our services, pricing or how we can grow your business.";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub typing_delay_min_ms: u64,
    pub typing_delay_max_ms: u64,
    pub nudge_delay_ms: u64,
    pub session_ttl_minutes: u64,
    pub tick_interval_ms: u64,
    pub knowledge_base_path: Option<PathBuf>,
    pub rng_seed: Option<u64>,
    pub whatsapp_number: String,
    pub contact_email: String,
    pub welcome_message: String,
    pub cors_allow_origin: Option<String>,
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            typing_delay_min_ms: 1000,
            typing_delay_max_ms: 2000,
            nudge_delay_ms: 3000,
            session_ttl_minutes: 30,
            tick_interval_ms: 250,
            knowledge_base_path: None,
            rng_seed: None,
            whatsapp_number: "+91 98765 43210".to_string(),
            contact_email: "hello@brightpathdigital.com".to_string(),
            welcome_message: DEFAULT_WELCOME.to_string(),
            cors_allow_origin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("PORT", defaults.port),
            typing_delay_min_ms: parse_or("TYPING_DELAY_MIN_MS", defaults.typing_delay_min_ms),
            typing_delay_max_ms: parse_or("TYPING_DELAY_MAX_MS", defaults.typing_delay_max_ms),
            nudge_delay_ms: parse_or("NUDGE_DELAY_MS", defaults.nudge_delay_ms),
            session_ttl_minutes: parse_or("SESSION_TTL_MINUTES", defaults.session_ttl_minutes),
            tick_interval_ms: parse_or("TICK_INTERVAL_MS", defaults.tick_interval_ms),
            knowledge_base_path: non_empty("KNOWLEDGE_BASE_PATH").map(PathBuf::from),
            rng_seed: non_empty("CHAT_RNG_SEED").and_then(|v| v.trim().parse().ok()),
            whatsapp_number: non_empty("WHATSAPP_NUMBER").unwrap_or(defaults.whatsapp_number),
            contact_email: non_empty("CONTACT_EMAIL").unwrap_or(defaults.contact_email),
            // set but empty disables the welcome message
            welcome_message: env::var("WELCOME_MESSAGE").unwrap_or(defaults.welcome_message),
            cors_allow_origin: non_empty("CORS_ALLOW_ORIGIN"),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.typing_delay_min_ms > self.typing_delay_max_ms {
            return Err(AppError::Config(format!(
                "TYPING_DELAY_MIN_MS ({}) exceeds TYPING_DELAY_MAX_MS ({})",
                self.typing_delay_min_ms, self.typing_delay_max_ms
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("TICK_INTERVAL_MS must be positive".into()));
        }
        if self.session_ttl_minutes == 0 {
            return Err(AppError::Config("SESSION_TTL_MINUTES must be positive".into()));
        }
        Ok(())
    }

    pub fn timing(&self) -> ChatTiming {
        ChatTiming {
            typing_min: Duration::from_millis(self.typing_delay_min_ms),
            typing_max: Duration::from_millis(self.typing_delay_max_ms),
            nudge_delay: Duration::from_millis(self.nudge_delay_ms),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_minutes * 60)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timing(), ChatTiming::default());
        assert_eq!(config.session_ttl(), Duration::from_secs(1800));
    }

    #[test]
    fn test_inverted_delays_rejected() {
        let config = AppConfig {
            typing_delay_min_ms: 3000,
            typing_delay_max_ms: 1000,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = AppConfig {
            session_ttl_minutes: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let config = AppConfig {
            tick_interval_ms: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
