//! Configuration for the orchestrator and its collaborators.
//!
//! Built once at process start and handed to every component;
//! nothing below reads the environment at call time.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::debug;

/// Listen address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig
{   pub host: String
  , pub port: u16
}

impl Default for ServerConfig
{   fn default() -> Self
    {   ServerConfig
        {   host: "0.0.0.0".to_string()
          , port: 8003
        }
    }
}

/// Where the classifier and prompt builder live.
/// `None` selects the in-process implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig
{   /// Emotion service base URL
    pub emotion_url: Option<String>
  , /// Prompt service base URL
    pub prompt_url: Option<String>
  , /// Directory with `normal_intensity.txt` / `high_intensity.txt`
    pub templates_dir: Option<PathBuf>
}

/// Generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig
{   /// Provider name: mock | openai | deepseek | api | gateway
    pub provider: String
  , /// API key for openai-compatible providers
    pub api_key: Option<String>
  , /// API base URL (if custom)
    pub base_url: Option<String>
  , /// Model name sent to openai-compatible providers
    pub api_model: String
  , /// Base URL of a remote generation service
    pub gateway_url: Option<String>
  , /// Per-request timeout for the primary provider
    pub request_timeout_secs: u64
}

impl Default for GenerationConfig
{   fn default() -> Self
    {   GenerationConfig
        {   provider: "mock".to_string()
          , api_key: None
          , base_url: None
          , api_model: "gpt-4o-mini".to_string()
          , gateway_url: None
          , request_timeout_secs: 30
        }
    }
}

/// Independent timeout per pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts
{   pub classify_ms: u64
  , pub prompt_ms: u64
  , /// Covers the primary attempt and the fallback
    pub generation_secs: u64
}

impl Default for StageTimeouts
{   fn default() -> Self
    {   StageTimeouts
        {   classify_ms: 5_000
          , prompt_ms: 5_000
          , generation_secs: 60
        }
    }
}

impl StageTimeouts
{   pub fn classify(&self) -> Duration
    {   Duration::from_millis(self.classify_ms)
    }

    pub fn prompt(&self) -> Duration
    {   Duration::from_millis(self.prompt_ms)
    }

    pub fn generation(&self) -> Duration
    {   Duration::from_secs(self.generation_secs)
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig
{   /// Append-only audit file; `None` disables auditing
    pub path: Option<PathBuf>
  , /// Characters of user text kept per line
    pub preview_chars: usize
}

impl Default for AuditConfig
{   fn default() -> Self
    {   AuditConfig
        {   path: None
          , preview_chars: 80
        }
    }
}

/// emoflow configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig
{   pub server: ServerConfig
  , pub services: ServicesConfig
  , pub generation: GenerationConfig
  , pub timeouts: StageTimeouts
  , pub audit: AuditConfig
}

impl OrchestratorConfig
{   /// Load a JSON config file; absent keys take defaults
    pub fn load(path: &Path)
      -> Result<Self, crate::error::Error>
    {   debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })?;
        serde_json::from_str(&text).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })
    }

    /// `EMOFLOW_CONFIG` file (if set) plus environment overrides
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   let base = match std::env::var("EMOFLOW_CONFIG")
        {   Ok(path) => Self::load(Path::new(&path))?
          , Err(_) => Self::default()
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup, then validate
    pub fn with_overrides<F>(
      mut self
    , lookup: F
    ) -> Result<Self, crate::error::Error>
    where F: Fn(&str) -> Option<String>
    {   if let Some(v) = lookup("EMOFLOW_HOST")
        {   self.server.host = v;
        }
        if let Some(v) = lookup("EMOFLOW_PORT")
        {   self.server.port = parse_number("EMOFLOW_PORT", &v)?;
        }
        if let Some(v) = lookup("EMOTION_SERVICE_URL")
        {   self.services.emotion_url = non_empty(v);
        }
        if let Some(v) = lookup("PROMPT_SERVICE_URL")
        {   self.services.prompt_url = non_empty(v);
        }
        if let Some(v) = lookup("PROMPT_TEMPLATES_DIR")
        {   self.services.templates_dir = non_empty(v).map(PathBuf::from);
        }
        if let Some(v) = lookup("LLM_PROVIDER")
        {   self.generation.provider = v;
        }
        if let Some(v) = lookup("LLM_API_KEY")
        {   self.generation.api_key = non_empty(v);
        }
        if let Some(v) = lookup("LLM_BASE_URL")
        {   self.generation.base_url = non_empty(v);
        }
        if let Some(v) = lookup("LLM_API_MODEL")
        {   self.generation.api_model = v;
        }
        if let Some(v) = lookup("LLM_GATEWAY_URL")
        {   self.generation.gateway_url = non_empty(v);
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS")
        {   self.generation.request_timeout_secs
              = parse_number("LLM_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("CLASSIFY_TIMEOUT_MS")
        {   self.timeouts.classify_ms
              = parse_number("CLASSIFY_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("PROMPT_TIMEOUT_MS")
        {   self.timeouts.prompt_ms
              = parse_number("PROMPT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("GENERATION_TIMEOUT_SECS")
        {   self.timeouts.generation_secs
              = parse_number("GENERATION_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AUDIT_LOG_PATH")
        {   self.audit.path = non_empty(v).map(PathBuf::from);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.timeouts.classify_ms == 0
          || self.timeouts.prompt_ms == 0
          || self.timeouts.generation_secs == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "stage timeouts must be non-zero".to_string()
            ));
        }
        // The fallback only runs if the primary gives up first
        if self.generation.request_timeout_secs
          >= self.timeouts.generation_secs
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!(
                "LLM request timeout ({}s) must be below the generation stage timeout ({}s)",
                self.generation.request_timeout_secs,
                self.timeouts.generation_secs
              )
            ));
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String>
{   let trimmed = value.trim();
    if trimmed.is_empty()
    {   None
    } else
    {   Some(trimmed.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(
  key: &str
, value: &str
) -> Result<T, crate::error::Error>
{   value.trim().parse::<T>().map_err(|_| {
      crate::error::Error::InvalidConfiguration(
        format!("{} is not a valid number: {}", key, value)
      )
    })
}
