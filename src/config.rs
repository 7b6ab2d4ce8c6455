use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

pub const DEFAULT_API_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_CAPTION_MODEL: &str = "Salesforce/blip-image-captioning-base";
pub const DEFAULT_VQA_MODEL: &str = "dandelin/vilt-b32-finetuned-vqa";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set (environment or .env file)")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Everything the inference client needs: credential, endpoints, schedule.
#[derive(Clone)]
pub struct InferenceConfig {
    pub api_token: String,
    pub api_base_url: String,
    pub caption_model: String,
    pub vqa_model: String,
    pub retry: RetryPolicy,
}

impl InferenceConfig {
    /// Default endpoints and schedule around the given token.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            caption_model: DEFAULT_CAPTION_MODEL.to_string(),
            vqa_model: DEFAULT_VQA_MODEL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.api_base_url.trim_end_matches('/'), model)
    }
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("caption_model", &self.caption_model)
            .field("vqa_model", &self.vqa_model)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub inference: InferenceConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let api_token = get("HUGGING_FACE_API_KEY").ok_or(ConfigError::Missing("HUGGING_FACE_API_KEY"))?;

        let max_attempts = match get("INFERENCE_MAX_ATTEMPTS") {
            Some(raw) => parse::<u32>("INFERENCE_MAX_ATTEMPTS", &raw)?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "INFERENCE_MAX_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        let delay = match get("INFERENCE_RETRY_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse::<u64>("INFERENCE_RETRY_DELAY_MS", &raw)?),
            None => DEFAULT_RETRY_DELAY,
        };

        let bind_addr = parse::<SocketAddr>(
            "BIND_ADDR",
            &get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => parse::<usize>("MAX_BODY_BYTES", &raw)?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Self {
            inference: InferenceConfig {
                api_token,
                api_base_url: get("HF_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                caption_model: get("CAPTION_MODEL").unwrap_or_else(|| DEFAULT_CAPTION_MODEL.to_string()),
                vqa_model: get("VQA_MODEL").unwrap_or_else(|| DEFAULT_VQA_MODEL.to_string()),
                retry: RetryPolicy {
                    max_attempts,
                    delay,
                },
            },
            server: ServerConfig {
                bind_addr,
                max_body_bytes,
            },
        })
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
