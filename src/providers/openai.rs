use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, error, trace};
use crate::request::{GenerateRequest, GenerationResult, Usage};

const DEFAULT_API_BASE: &str
  = "https://api.openai.com/v1";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Value>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub content: Option<String>
}

// ===== Client =====

/// OpenAI-compatible chat-completions client
/// (OpenAI, DeepSeek, or any self-hosted compatible gateway)
pub struct OpenAiCompatibleClient
{   name: String
  , api_key: Option<String>
  , api_base: String
  , model: String
  , http_client: reqwest::Client
}

impl OpenAiCompatibleClient
{   pub fn new(
      name: &str
    , api_key: Option<String>
    , api_base: Option<String>
    , model: &str
    , timeout: Duration
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating OpenAiCompatibleClient '{}'", name);
        let http_client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(OpenAiCompatibleClient
        {   name: name.to_string()
          , api_key
          , api_base: api_base
              .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
              .trim_end_matches('/')
              .to_string()
          , model: model.to_string()
          , http_client
        })
    }

    fn get_api_key(&self)
      -> Result<&str, crate::error::Error>
    {   self.api_key.as_deref().ok_or_else(|| {
          error!("No API key for provider: {}", self.name);
          crate::error::Error::MissingApiKey(self.name.clone())
        })
    }
}

#[async_trait]
impl super::GenerationClient for OpenAiCompatibleClient
{   fn name(&self) -> &str
    {   &self.name
    }

    async fn generate(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>
    {   debug!("Handling generate for model: {}", self.model);

        let api_key = self.get_api_key()?;

        let body = ChatCompletionRequest
        {   model: self.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "user".to_string()
                , content: request.prompt.clone()
              }
            ]
          , max_tokens: request.max_tokens
          , temperature: Some(0.7)
        };

        trace!("Chat completion request: {:?}", body);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::from(e)
          })?;

        let status = response.status();
        trace!("Chat completion status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("API provider error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              format!("{} failed: {}", self.name, error_text)
            ));
        }

        let completion: ChatCompletionResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        let text = completion.choices.first()
          .map(|c| c.message.content.clone().unwrap_or_default())
          .ok_or_else(|| {
            error!("No choices in response");
            crate::error::Error::NoChoicesInResponse
          })?;

        let mut usage = match completion.usage
        {   Some(Value::Object(map)) => map
          , _ => Usage::new()
        };
        usage.insert("model".to_string(), Value::String(self.model.clone()));

        Ok(GenerationResult
        {   text
          , provider: self.name.clone()
          , usage
        })
    }
}
