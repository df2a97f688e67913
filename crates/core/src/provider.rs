use crate::error::{Result, SentiscopeError};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-002";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_base: String,
    pub model: String,
    pub env_var: &'static str,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            env_var: API_KEY_ENV,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("SENTISCOPE_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("SENTISCOPE_MODEL") {
            config.model = model;
        }
        config
    }

    pub fn name(&self) -> &'static str {
        "Gemini"
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        match std::env::var(self.env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(SentiscopeError::MissingApiKey {
                env_var: self.env_var.to_string(),
            }),
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload/v1beta/files", self.api_base)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.api_base, name)
    }

    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}
