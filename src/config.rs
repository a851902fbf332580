use crate::error::{Error, Result};
use crate::services::exam_service::GenerationSettings;
use crate::services::quota_service::QuotaLimits;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub firebase_project_id: String,
    pub max_rpm: u32,
    pub max_rpd: u32,
    pub max_tpm: u64,
    pub quota_cooldown_secs: u64,
    pub tokens_per_word: u64,
    pub mcq_primary_attempts_per_question: usize,
    pub mcq_fallback_attempts_per_question: usize,
    pub max_upload_mb: usize,
    pub cors_allowed_origins: Vec<String>,
    pub log_json: bool,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            gemini_api_key: get_env("GEMINI_API_KEY")?,
            gemini_model: get_env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            gemini_api_base: get_env_or(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            firebase_project_id: firebase_project_id()?,
            max_rpm: get_env_parse_or("MAX_RPM", 15)?,
            max_rpd: get_env_parse_or("MAX_RPD", 1500)?,
            max_tpm: get_env_parse_or("MAX_TPM", 1_000_000)?,
            quota_cooldown_secs: get_env_parse_or("QUOTA_COOLDOWN_SECS", 60)?,
            tokens_per_word: get_env_parse_or("TOKENS_PER_WORD", 2)?,
            mcq_primary_attempts_per_question: get_env_parse_or(
                "MCQ_PRIMARY_ATTEMPTS_PER_QUESTION",
                1,
            )?,
            mcq_fallback_attempts_per_question: get_env_parse_or(
                "MCQ_FALLBACK_ATTEMPTS_PER_QUESTION",
                2,
            )?,
            max_upload_mb: get_env_parse_or("MAX_UPLOAD_MB", 25)?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    pub fn quota_limits(&self) -> QuotaLimits {
        QuotaLimits {
            max_rpm: self.max_rpm,
            max_rpd: self.max_rpd,
            max_tpm: self.max_tpm,
            cooldown: Duration::from_secs(self.quota_cooldown_secs),
            tokens_per_word: self.tokens_per_word,
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            mcq_primary_attempts_per_question: self.mcq_primary_attempts_per_question.max(1),
            mcq_fallback_attempts_per_question: self.mcq_fallback_attempts_per_question,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        megabytes_to_bytes(self.max_upload_mb)
    }
}

fn megabytes_to_bytes(megabytes: usize) -> usize {
    megabytes.saturating_mul(1024 * 1024)
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// The project id either comes directly or out of the base64 service-account blob.
fn firebase_project_id() -> Result<String> {
    if let Ok(id) = env::var("FIREBASE_PROJECT_ID") {
        return Ok(id);
    }
    let encoded = env::var("FIREBASE_CONFIG_B64").map_err(|_| {
        Error::Config(
            "Missing environment variable: FIREBASE_PROJECT_ID or FIREBASE_CONFIG_B64".to_string(),
        )
    })?;
    project_id_from_service_account(&encoded)
}

pub fn project_id_from_service_account(encoded: &str) -> Result<String> {
    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|e| Error::Config(format!("FIREBASE_CONFIG_B64 is not valid base64: {}", e)))?;
    let account: serde_json::Value = serde_json::from_slice(&decoded)?;
    account
        .get("project_id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Config("FIREBASE_CONFIG_B64 has no project_id".to_string()))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_saturates_instead_of_overflowing() {
        assert_eq!(megabytes_to_bytes(25), 25 * 1024 * 1024);
        assert_eq!(megabytes_to_bytes(usize::MAX), usize::MAX);
    }

    #[test]
    fn project_id_is_read_from_service_account_blob() {
        let blob = BASE64.encode(r#"{"type":"service_account","project_id":"studify-test"}"#);
        assert_eq!(project_id_from_service_account(&blob).unwrap(), "studify-test");
    }

    #[test]
    fn service_account_without_project_id_is_a_config_error() {
        let blob = BASE64.encode(r#"{"type":"service_account"}"#);
        assert!(matches!(
            project_id_from_service_account(&blob),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("http://localhost:5173, https://studify.app ,"),
            vec!["http://localhost:5173", "https://studify.app"]
        );
    }
}
