use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use common::ConflictThresholds;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens.
    pub token_ttl_hours: i64,
}

/// Standard-deviation cutoffs for evaluator disagreement.
#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationConfig {
    pub medium_threshold: f64,
    pub high_threshold: f64,
    pub overview_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        let t = ConflictThresholds::default();
        Self {
            medium_threshold: t.medium,
            high_threshold: t.high,
            overview_threshold: t.overview,
        }
    }
}

impl EvaluationConfig {
    pub fn thresholds(&self) -> ConflictThresholds {
        ConflictThresholds {
            medium: self.medium_threshold,
            high: self.high_threshold,
            overview: self.overview_threshold,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub evaluation: EvaluationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("evaluation.medium_threshold", 1.5)?
            .set_default("evaluation.high_threshold", 3.0)?
            .set_default("evaluation.overview_threshold", 2.0)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PORTAL__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("PORTAL").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < 16 {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be at least 16 characters".into(),
            ));
        }
        let e = &self.evaluation;
        if !(e.medium_threshold >= 0.0 && e.medium_threshold <= e.high_threshold) {
            return Err(ConfigError::Message(
                "evaluation.medium_threshold must be between 0 and evaluation.high_threshold"
                    .into(),
            ));
        }
        if e.overview_threshold.is_nan() || e.overview_threshold < 0.0 {
            return Err(ConfigError::Message(
                "evaluation.overview_threshold must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}
