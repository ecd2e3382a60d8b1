//! Flow orchestration: the `chat` pipeline and the scripted flows.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use serde_json::json;
use uuid::Uuid;
use log::{debug, error, info, warn};
use crate::audit::{AuditEntry, AuditSink, AuditStatus, FileAuditLog, NoopAuditLog};
use crate::client::ProviderRouter;
use crate::config::{OrchestratorConfig, StageTimeouts};
use crate::emotion::{EmotionClassifier, HttpEmotionClassifier, KeywordClassifier};
use crate::failover::{PrimaryThenFallbackGenerator, Served};
use crate::prompt::{HttpPromptBuilder, PromptBuilder, TemplatePromptBuilder};
use crate::request::{
  EmotionPayload, FlowMeta, FlowResponse, GenerateRequest, PromptRequest, SafetyStatus
};
use crate::{safety, Exercise, FlowName, Mode};

pub const BREATHING_MESSAGE: &str
  = "Box breathing: 4s inhale, 4s hold, 4s exhale, 4s hold.";

pub const BREATHING_STEPS: [&str; 4] = [
  "Inhale gently through the nose for 4 seconds."
, "Hold your breath softly for 4 seconds."
, "Exhale through the mouth for 4 seconds."
, "Hold again for 4 seconds. Repeat for 3-5 cycles."
];

pub const CLARIFY_MESSAGE: &str
  = "Let's clarify: note the facts, your emotions, and what you need next.";

const FACTS_PROMPT: &str = "List the key facts you know.";
const EMOTIONS_PROMPT: &str
  = "Name what you feel right now (e.g., anxious, frustrated, sad).";
const NEEDS_PROMPT: &str
  = "State what you need or hope for (e.g., clarity, support, time).";

fn new_trace_id() -> String
{   Uuid::new_v4().to_string()
}

/// Run one stage under its own deadline
async fn stage<T, F>(
  limit: Duration
, name: &str
, fut: F
) -> Result<T, crate::error::Error>
where F: Future<Output = Result<T, crate::error::Error>>
{   tokio::time::timeout(limit, fut)
      .await
      .map_err(|_| crate::error::Error::Timeout(name.to_string()))?
}

/// Sequences safety gate, classifier, prompt builder and
/// generator for each request. Holds no per-request state, so
/// one instance serves concurrent callers.
pub struct FlowOrchestrator
{   classifier: Arc<dyn EmotionClassifier>
  , prompts: Arc<dyn PromptBuilder>
  , generator: Arc<PrimaryThenFallbackGenerator>
  , audit: Arc<dyn AuditSink>
  , timeouts: StageTimeouts
}

impl FlowOrchestrator
{   pub fn new(
      classifier: Arc<dyn EmotionClassifier>
    , prompts: Arc<dyn PromptBuilder>
    , generator: PrimaryThenFallbackGenerator
    , audit: Arc<dyn AuditSink>
    , timeouts: StageTimeouts
    ) -> Self
    {   FlowOrchestrator
        {   classifier
          , prompts
          , generator: Arc::new(generator)
          , audit
          , timeouts
        }
    }

    /// Wire collaborators from configuration: remote services
    /// when URLs are set, in-process implementations otherwise.
    pub fn from_config(
      config: &OrchestratorConfig
    ) -> Result<Self, crate::error::Error>
    {   config.validate()?;
        let classifier: Arc<dyn EmotionClassifier>
          = match &config.services.emotion_url
          {   Some(url) => Arc::new(
                HttpEmotionClassifier::new(url, config.timeouts.classify())?
              )
            , None => Arc::new(KeywordClassifier::new())
          };

        let prompts: Arc<dyn PromptBuilder>
          = match (&config.services.prompt_url, &config.services.templates_dir)
          {   (Some(url), _) => Arc::new(
                HttpPromptBuilder::new(url, config.timeouts.prompt())?
              )
            , (None, Some(dir)) => Arc::new(TemplatePromptBuilder::from_dir(dir)?)
            , (None, None) => Arc::new(TemplatePromptBuilder::new())
          };

        let router = ProviderRouter::from_config(&config.generation)?;
        let generator = PrimaryThenFallbackGenerator::new(Arc::new(router))
          .with_primary_timeout(Duration::from_secs(
            config.generation.request_timeout_secs
          ));

        let audit: Arc<dyn AuditSink> = match &config.audit.path
        {   Some(path) => Arc::new(FileAuditLog::new(
              path.clone(), config.audit.preview_chars
            ))
          , None => Arc::new(NoopAuditLog)
        };

        Ok(Self::new(
          classifier, prompts, generator, audit, config.timeouts.clone()
        ))
    }

    pub fn classifier(&self) -> Arc<dyn EmotionClassifier>
    {   Arc::clone(&self.classifier)
    }

    pub fn prompt_builder(&self) -> Arc<dyn PromptBuilder>
    {   Arc::clone(&self.prompts)
    }

    pub fn generator(&self) -> Arc<PrimaryThenFallbackGenerator>
    {   Arc::clone(&self.generator)
    }

    fn audit(
      &self
    , flow: FlowName
    , trace_id: &str
    , status: AuditStatus
    , text: &str
    )
    {   self.audit.record(AuditEntry::new(flow, trace_id, status, text));
    }

    /// Envelope for a request body that could not be read
    pub fn reject(&self, flow: FlowName, detail: String) -> FlowResponse
    {   let trace_id = new_trace_id();
        debug!("[{}] rejecting {} body: {}", trace_id, flow, detail);
        self.audit(flow, &trace_id, AuditStatus::Error, "");
        FlowResponse::failure(
          &crate::error::Error::InvalidInput(detail),
          FlowMeta::new(flow, &trace_id)
        )
    }

    // ===== chat =====

    pub async fn chat(&self, text: &str) -> FlowResponse
    {   let trace_id = new_trace_id();
        let meta = FlowMeta::new(FlowName::Chat, &trace_id);

        if text.trim().is_empty()
        {   debug!("[{}] rejecting empty input", trace_id);
            self.audit(FlowName::Chat, &trace_id, AuditStatus::Error, text);
            return FlowResponse::failure(
              &crate::error::Error::InvalidInput(
                "text is required".to_string()
              ),
              meta
            );
        }

        if !safety::is_safe(text)
        {   info!("[{}] input blocked by safety gate", trace_id);
            self.audit(FlowName::Chat, &trace_id, AuditStatus::Blocked, text);
            return blocked_response(meta);
        }

        match self.run_chat(text, &trace_id, meta.clone()).await
        {   Ok((response, served)) => {
              let status = match served
              {   Served::Primary => AuditStatus::Ok
                , Served::Fallback => AuditStatus::Fallback
              };
              self.audit(FlowName::Chat, &trace_id, status, text);
              response
            }
          , Err(e) => {
              error!("[{}] chat flow failed: {}", trace_id, e);
              self.audit(FlowName::Chat, &trace_id, AuditStatus::Error, text);
              FlowResponse::failure(&e, meta)
            }
        }
    }

    async fn run_chat(
      &self
    , text: &str
    , trace_id: &str
    , mut meta: FlowMeta
    ) -> Result<(FlowResponse, Served), crate::error::Error>
    {   let emotion = stage(
          self.timeouts.classify()
        , "emotion classification"
        , self.classifier.classify(text)
        ).await?;

        let tier = emotion.tier();
        debug!(
          "[{}] emotion {} level {} -> {}",
          trace_id, emotion.label, emotion.intensity,
          Mode::for_intensity(tier).as_str()
        );

        let mut context = BTreeMap::new();
        context.insert("traceId".to_string(), trace_id.to_string());
        let prompt_request = PromptRequest
        {   label: emotion.label
          , intensity: tier
          , text: text.to_string()
          , context
        };
        let prompt = stage(
          self.timeouts.prompt()
        , "prompt building"
        , self.prompts.build(&prompt_request)
        ).await?;

        // A remote builder may bucket intensity differently. A more
        // cautious prompt is adopted; a less cautious one is refused.
        let policy = Mode::for_intensity(tier);
        if prompt.mode < policy
        {   warn!(
              "[{}] prompt builder chose {} for a {} emotion",
              trace_id, prompt.mode.as_str(), tier.as_str()
            );
            return Err(crate::error::Error::PromptBuild(format!(
              "template {} is {} but a {} emotion requires {}",
              prompt.template_name, prompt.mode.as_str(),
              tier.as_str(), policy.as_str()
            )));
        }
        let mode = prompt.mode;

        let generate_request = GenerateRequest
        {   prompt: prompt.prompt.clone()
          , max_tokens: prompt.max_tokens()
          , provider_override: None
        };
        let tagged = stage(
          self.timeouts.generation()
        , "generation"
        , self.generator.generate_tagged(&generate_request)
        ).await?;

        let suggested = mode.suggested_exercise();
        meta.template = Some(prompt.template_name.clone());
        meta.llm_provider = Some(tagged.result.provider.clone());
        meta.usage = Some(tagged.result.usage.clone());
        meta.suggested_exercise = Some(suggested);
        let meta = meta.with_extra("llmParams", json!(prompt.params));

        let payload = EmotionPayload
        {   label: emotion.label
          , intensity: tier
          , score: emotion.label_score()
          , scores: emotion.scores.clone()
        };

        Ok((
          FlowResponse::reply(
            tagged.result.text
          , Some(mode)
          , meta
          , Some(payload)
          , Some(suggested)
          )
        , tagged.served
        ))
    }

    // ===== scripted flows =====

    pub fn breathing(&self, text: &str) -> FlowResponse
    {   let trace_id = new_trace_id();
        let mut meta = FlowMeta::new(FlowName::Breathing, &trace_id)
          .with_extra("title", "Box Breathing")
          .with_extra("steps", json!(BREATHING_STEPS))
          .with_extra("duration", "1-2 minutes");
        meta.suggested_exercise = Some(Exercise::Breathing);

        self.audit(FlowName::Breathing, &trace_id, AuditStatus::Ok, text);
        FlowResponse::reply(
          BREATHING_MESSAGE.to_string()
        , None
        , meta
        , None
        , Some(Exercise::Breathing)
        )
    }

    pub fn thought_clarify(&self, text: &str) -> FlowResponse
    {   let trace_id = new_trace_id();
        let trimmed = text.trim();
        let facts = if trimmed.is_empty()
        {   FACTS_PROMPT.to_string()
        } else
        {   format!("You mentioned: {}", trimmed)
        };
        let mut meta = FlowMeta::new(FlowName::ThoughtClarify, &trace_id)
          .with_extra("facts", facts)
          .with_extra("emotions", EMOTIONS_PROMPT)
          .with_extra("needs", NEEDS_PROMPT);
        meta.suggested_exercise = Some(Exercise::ThoughtLog);

        self.audit(FlowName::ThoughtClarify, &trace_id, AuditStatus::Ok, text);
        FlowResponse::reply(
          CLARIFY_MESSAGE.to_string()
        , None
        , meta
        , None
        , Some(Exercise::ThoughtLog)
        )
    }
}

/// Refusal: a successful response, not an error
fn blocked_response(mut meta: FlowMeta) -> FlowResponse
{   meta.safety = Some(SafetyStatus::Blocked);
    meta.suggested_exercise = Some(Exercise::Breathing);
    FlowResponse::reply(
      safety::hard_stop_message().to_string()
    , Some(Mode::HighSafety)
    , meta
    , None
    , Some(Exercise::Breathing)
    )
}
