//! Runtime settings, read from an optional `settings.toml` next to the binary
//! and overridden by `CARRENTAL__<SECTION>__<KEY>` environment variables.

use config::{Config, ConfigError, Environment, File};
use engine::{CancellationPolicy, PricingPolicy};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Referral {
    pub reward_minor: i64,
}

impl Default for Referral {
    fn default() -> Self {
        Self {
            reward_minor: engine::DEFAULT_REFERRAL_REWARD_MINOR,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub pricing: PricingPolicy,
    #[serde(default)]
    pub cancellation: CancellationPolicy,
    #[serde(default)]
    pub referral: Referral,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("CARRENTAL").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert_eq!(settings.pricing, PricingPolicy::default());
        assert_eq!(settings.cancellation, CancellationPolicy::default());
        assert_eq!(
            settings.referral.reward_minor,
            engine::DEFAULT_REFERRAL_REWARD_MINOR
        );
    }

    #[test]
    fn server_and_policies_are_read() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 8080
            database = { sqlite = "rental.db" }

            [pricing]
            tax_rate_bps = 2200

            [cancellation]
            free_hours = 72
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.port, 8080);
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "rental.db"));
        assert_eq!(settings.pricing.tax_rate_bps, 2_200);
        assert_eq!(settings.pricing.weekly_discount_bps, 1_000);
        assert_eq!(settings.cancellation.free_hours, 72);
        assert_eq!(settings.cancellation.late_hours, 24);
    }
}
