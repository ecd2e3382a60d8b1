//! Prompt builder port and its implementations

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, trace, warn};
use crate::request::{PromptRequest, PromptResult};
use crate::Mode;

pub const NORMAL_TEMPLATE_NAME: &str = "normal_intensity";
pub const HIGH_TEMPLATE_NAME: &str = "high_intensity";

const NORMAL_TEMPLATE: &str = "\
You are a calm, supportive listener helping someone reflect on how they feel.
The person seems {emotion} (intensity: {intensity}).

They wrote:
\"{user_text}\"

{context}

Reply in two or three short sentences: acknowledge the feeling, reflect one \
concrete detail back, and offer one gentle next step. Do not diagnose.";

const HIGH_TEMPLATE: &str = "\
You are a careful, grounding companion. The person may be in acute distress.
Detected emotion: {emotion} (intensity: {intensity}).

They wrote:
\"{user_text}\"

{context}

Reply briefly and calmly. Validate the feeling, suggest one slow breathing or \
grounding step, and encourage reaching out to someone they trust or to local \
emergency services if they feel unsafe. Do not give clinical advice.";

/// Maps (label, intensity, text, context) to a generation-ready prompt
#[async_trait]
pub trait PromptBuilder: Send + Sync
{   async fn build(
      &self
    , request: &PromptRequest
    ) -> Result<PromptResult, crate::error::Error>;
}

/// Generation params per mode
pub fn default_params(mode: Mode) -> BTreeMap<String, f64>
{   let (temperature, max_tokens) = match mode
    {   Mode::Normal => (0.4, 320.0)
      , Mode::HighSafety => (0.2, 256.0)
    };
    [ ("temperature".to_string(), temperature)
    , ("maxTokens".to_string(), max_tokens)
    ].into_iter().collect()
}

fn context_block(context: &BTreeMap<String, String>) -> String
{   if context.is_empty()
    {   return "Context: none provided.".to_string();
    }
    let lines: Vec<String> = context
      .iter()
      .map(|(k, v)| format!("- {}: {}", k, v))
      .collect();
    format!("Context:\n{}", lines.join("\n"))
}

// ===== Template builder =====

/// In-process builder over two templates, one per mode
#[derive(Debug, Clone)]
pub struct TemplatePromptBuilder
{   normal: String
  , high: String
}

impl Default for TemplatePromptBuilder
{   fn default() -> Self
    {   TemplatePromptBuilder
        {   normal: NORMAL_TEMPLATE.to_string()
          , high: HIGH_TEMPLATE.to_string()
        }
    }
}

impl TemplatePromptBuilder
{   pub fn new() -> Self
    {   Self::default()
    }

    /// Load `normal_intensity.txt` / `high_intensity.txt` from `dir`.
    /// A missing file keeps the built-in template.
    pub fn from_dir(dir: &Path) -> Result<Self, crate::error::Error>
    {   debug!("Loading prompt templates from {}", dir.display());
        let mut builder = Self::default();
        if let Some(text) = read_template(dir, NORMAL_TEMPLATE_NAME)?
        {   builder.normal = text;
        }
        if let Some(text) = read_template(dir, HIGH_TEMPLATE_NAME)?
        {   builder.high = text;
        }
        Ok(builder)
    }

    fn template_for(&self, mode: Mode) -> (&str, &'static str)
    {   match mode
        {   Mode::Normal => (self.normal.as_str(), NORMAL_TEMPLATE_NAME)
          , Mode::HighSafety => (self.high.as_str(), HIGH_TEMPLATE_NAME)
        }
    }
}

fn read_template(
  dir: &Path
, name: &str
) -> Result<Option<String>, crate::error::Error>
{   let path = dir.join(format!("{}.txt", name));
    match std::fs::read_to_string(&path)
    {   Ok(text) => Ok(Some(text))
      , Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
          warn!(
            "Template {} not found, using built-in",
            path.display()
          );
          Ok(None)
        }
      , Err(e) => Err(crate::error::Error::InvalidConfiguration(
          format!("{}: {}", path.display(), e)
        ))
    }
}

#[async_trait]
impl PromptBuilder for TemplatePromptBuilder
{   async fn build(
      &self
    , request: &PromptRequest
    ) -> Result<PromptResult, crate::error::Error>
    {   let mode = Mode::for_intensity(request.intensity);
        let (template, template_name) = self.template_for(mode);

        let prompt = template
          .replace("{emotion}", request.label.as_str())
          .replace("{intensity}", request.intensity.as_str())
          .replace("{context}", &context_block(&request.context))
          .replace("{user_text}", request.text.trim())
          .trim()
          .to_string();

        if prompt.is_empty()
        {   error!("Template {} rendered empty", template_name);
            return Err(crate::error::Error::PromptBuild(
              format!("template {} rendered empty", template_name)
            ));
        }
        trace!("Rendered prompt: {}", prompt);

        Ok(PromptResult
        {   prompt
          , mode
          , params: default_params(mode)
          , template_name: template_name.to_string()
        })
    }
}

// ===== Remote builder =====

/// Calls `POST {base_url}/build` on a prompt service
pub struct HttpPromptBuilder
{   base_url: String
  , http_client: reqwest::Client
}

impl HttpPromptBuilder
{   pub fn new(
      base_url: &str
    , timeout: Duration
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating HttpPromptBuilder for {}", base_url);
        let http_client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(HttpPromptBuilder
        {   base_url: base_url.trim_end_matches('/').to_string()
          , http_client
        })
    }
}

#[async_trait]
impl PromptBuilder for HttpPromptBuilder
{   async fn build(
      &self
    , request: &PromptRequest
    ) -> Result<PromptResult, crate::error::Error>
    {   let response = self.http_client
          .post(format!("{}/build", self.base_url))
          .json(request)
          .send()
          .await
          .map_err(|e| {
            error!("Prompt service unreachable: {}", e);
            crate::error::Error::PromptBuild(e.to_string())
          })?;

        let status = response.status();
        trace!("Prompt service status: {}", status);
        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Prompt service error: {}", error_text);
            return Err(crate::error::Error::PromptBuild(
              format!("{}: {}", status, error_text)
            ));
        }

        let result: PromptResult = response.json().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::PromptBuild(e.to_string())
        })?;
        if result.prompt.trim().is_empty()
        {   return Err(crate::error::Error::PromptBuild(
              "prompt service returned an empty prompt".to_string()
            ));
        }
        Ok(result)
    }
}
