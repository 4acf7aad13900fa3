/// Configuration management for the sopflow backend
///
/// Handles server binding, hosted-store credentials, and AI generator
/// settings. Everything is read from environment variables; `main` loads a
/// `.env` file first so local development needs no shell exports.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Hosted row-store configuration
    pub supabase: SupabaseConfig,
    /// Text-to-workflow generator configuration
    pub ai: AiConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Hosted row-store configuration
///
/// When `url` is empty the server falls back to the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://xyz.supabase.co")
    pub url: String,
    /// Service-role key, preferred for backend deployments
    pub service_role_key: String,
    /// Anon key, used when no service-role key is configured
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }

    pub fn api_key(&self) -> &str {
        if !self.service_role_key.is_empty() {
            &self.service_role_key
        } else {
            &self.anon_key
        }
    }
}

/// Text-to-workflow generator configuration (Google Gemini)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Gemini API key; generation endpoints fail with a structured error
    /// when this is empty
    pub api_key: String,
    /// Gemini model name
    pub model: String,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("SOPFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("SOPFLOW_PORT")
                    .unwrap_or_else(|_| "3001".to_string())
                    .parse()
                    .unwrap_or(3001),
            },
            supabase: SupabaseConfig {
                url: std::env::var("SUPABASE_URL").unwrap_or_default(),
                service_role_key: std::env::var("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_default(),
                anon_key: std::env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            },
            ai: AiConfig {
                api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash-001".to_string()),
            },
        }
    }
}
