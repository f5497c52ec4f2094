// src/config.rs
use crate::errors::MockitError;
use crate::services::gemini_service::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::services::image_processor::DEFAULT_MAX_UPLOAD_BYTES;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub redis_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: usize,
    pub catalog_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, MockitError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, MockitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str, default: usize| -> Result<usize, MockitError> {
            match var(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .map_err(|_| MockitError::Config(format!("{} must be a number, got '{}'", key, v))),
                None => Ok(default),
            }
        };

        let gemini_api_key = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .ok_or_else(|| MockitError::Config("GEMINI_API_KEY must be set".to_string()))?;

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_upload_bytes: number("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_ttl_secs: number("SESSION_TTL_SECS", 86400)?,
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            static_dir: var("STATIC_DIR").map(PathBuf::from),
        })
    }
}
