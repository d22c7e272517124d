use serde::Deserialize;
use std::env;

use crate::error::EnforcementError;

#[derive(Debug, Clone, Deserialize)]
pub struct EnforcementConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub port: u16,
    pub token: TokenConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// HS256 secret for the claims token
    pub secret: String,
    pub ttl_minutes: i64,
}

impl EnforcementConfig {
    pub fn from_env() -> Result<Self, EnforcementError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| EnforcementError::Internal(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        Ok(EnforcementConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("enforcement-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    EnforcementError::Internal(anyhow::anyhow!(e.to_string()))
                })?,
            token: TokenConfig {
                // The secret has no default even in dev; it is shared with
                // the token issuer and must be provisioned explicitly.
                secret: get_env("TOKEN_SECRET", None, true)?,
                ttl_minutes: get_env("TOKEN_TTL_MINUTES", Some("60"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        EnforcementError::Internal(anyhow::anyhow!(e.to_string()))
                    })?,
            },
        })
    }
}

/// Read an environment variable, falling back to `default` in dev.
/// In prod (or when no default exists) a missing variable is an error,
/// so misconfiguration fails fast at startup.
fn get_env(key: &str, default: Option<&str>, strict: bool) -> Result<String, EnforcementError> {
    match env::var(key) {
        Ok(value) => Ok(value),
        Err(_) => match default {
            Some(value) if !strict => Ok(value.to_string()),
            _ => Err(EnforcementError::Internal(anyhow::anyhow!(
                "Missing required environment variable: {key}"
            ))),
        },
    }
}
