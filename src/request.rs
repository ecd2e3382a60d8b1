//! Wire types and the response envelope

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::emotion::EmotionLabel;
use crate::{Exercise, FlowName, Intensity, Mode};

/// Provider usage counters and fallback annotations
pub type Usage = Map<String, Value>;

/// Message shown in place of a reply when a flow fails
pub const GENERIC_APOLOGY: &str
  = "Something went wrong. Please try again.";

/// Inbound body for every flow route and for `/classify`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest
{   /// Raw user text; missing or `null` reads as empty
    #[serde(default)]
    pub text: Option<String>
}

impl ChatRequest
{   pub fn new(text: &str) -> Self
    {   ChatRequest
        {   text: Some(text.to_string())
        }
    }

    pub fn text(&self) -> &str
    {   self.text.as_deref().unwrap_or("")
    }
}

/// Machine-readable error code carried in the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode
{   InvalidInput
  , InternalError
  , UnknownFlow
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody
{   pub code: ErrorCode
  , pub detail: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyStatus
{   Blocked
}

/// Emotion summary attached to chat replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPayload
{   pub label: EmotionLabel
  , pub intensity: Intensity
  , /// Score of the dominant label
    pub score: f32
  , pub scores: BTreeMap<EmotionLabel, f32>
}

/// Flow metadata: fixed optional fields plus an open
/// extension map that is flattened into the same JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMeta
{   pub flow: FlowName
  , pub trace_id: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_exercise: Option<Exercise>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<SafetyStatus>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl FlowMeta
{   pub fn new(flow: FlowName, trace_id: &str) -> Self
    {   FlowMeta
        {   flow
          , trace_id: trace_id.to_string()
          , template: None
          , llm_provider: None
          , usage: None
          , suggested_exercise: None
          , safety: None
          , extra: Map::new()
        }
    }

    /// Add a flow-specific key
    pub fn with_extra(
      mut self
    , key: &str
    , value: impl Into<Value>
    ) -> Self
    {   self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// The envelope returned by every flow.
///
/// Either `message` carries a normal reply and `error` is `None`,
/// or `error` is set and `message` is [`GENERIC_APOLOGY`].
/// `reply` always mirrors `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResponse
{   pub message: String
  , pub reply: String
  , #[serde(alias = "trace_id")]
    pub trace_id: String
  , pub mode: Option<Mode>
  , pub meta: FlowMeta
  , pub emotion: Option<EmotionPayload>
  , pub suggested_exercise: Option<Exercise>
  , pub error: Option<ErrorBody>
}

impl FlowResponse
{   /// Successful reply (including a safety refusal)
    pub fn reply(
      message: String
    , mode: Option<Mode>
    , meta: FlowMeta
    , emotion: Option<EmotionPayload>
    , suggested_exercise: Option<Exercise>
    ) -> Self
    {   FlowResponse
        {   reply: message.clone()
          , message
          , trace_id: meta.trace_id.clone()
          , mode
          , meta
          , emotion
          , suggested_exercise
          , error: None
        }
    }

    /// Structured failure with the generic apology as message
    pub fn failure(
      error: &crate::error::Error
    , meta: FlowMeta
    ) -> Self
    {   let detail = match error
        {   crate::error::Error::InvalidInput(msg) => msg.clone()
          , other => other.to_string()
        };
        FlowResponse
        {   message: GENERIC_APOLOGY.to_string()
          , reply: GENERIC_APOLOGY.to_string()
          , trace_id: meta.trace_id.clone()
          , mode: None
          , meta
          , emotion: None
          , suggested_exercise: None
          , error: Some(ErrorBody
            {   code: error.code()
              , detail
            })
        }
    }

    pub fn is_error(&self) -> bool
    {   self.error.is_some()
    }
}

/// Body of `POST /build`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest
{   pub label: EmotionLabel
  , pub intensity: Intensity
  , pub text: String
  , #[serde(default)]
    pub context: BTreeMap<String, String>
}

/// Output of a prompt builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult
{   pub prompt: String
  , pub mode: Mode
  , #[serde(default)]
    pub params: BTreeMap<String, f64>
  , pub template_name: String
}

impl PromptResult
{   /// `maxTokens` from the generation params, when present
    pub fn max_tokens(&self) -> Option<u32>
    {   self.params
          .get("maxTokens")
          .filter(|v| v.is_finite() && **v > 0.0)
          .map(|v| *v as u32)
    }
}

/// Body of `POST /generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest
{   pub prompt: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_override: Option<String>
}

impl GenerateRequest
{   pub fn new(prompt: impl Into<String>) -> Self
    {   GenerateRequest
        {   prompt: prompt.into()
          , max_tokens: None
          , provider_override: None
        }
    }
}

/// Output of a generation client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult
{   pub text: String
  , /// Backend that actually produced `text`
    pub provider: String
  , #[serde(default)]
    pub usage: Usage
}
