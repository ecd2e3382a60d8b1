#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use emoflow::audit::{AuditEntry, AuditSink, NoopAuditLog};
use emoflow::config::StageTimeouts;
use emoflow::emotion::{EmotionClassifier, EmotionLabel, EmotionResult};
use emoflow::failover::PrimaryThenFallbackGenerator;
use emoflow::prompt::{PromptBuilder, TemplatePromptBuilder};
use emoflow::providers::GenerationClient;
use emoflow::request::{GenerateRequest, GenerationResult, PromptRequest, PromptResult, Usage};
use emoflow::{Error, FlowOrchestrator, Mode};

/// Ordered record of collaborator calls
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn new_log() -> CallLog
{   Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<&'static str>
{   log.lock().unwrap().clone()
}

pub fn emotion(label: EmotionLabel, score: f32, intensity: u8)
  -> EmotionResult
{   let mut scores: BTreeMap<EmotionLabel, f32> = EmotionLabel::ALL
      .iter()
      .map(|l| (*l, 0.0))
      .collect();
    scores.insert(label, score);
    EmotionResult
    {   label
      , intensity
      , scores
    }
}

pub struct StubClassifier
{   pub log: CallLog
  , pub result: Result<EmotionResult, Error>
}

#[async_trait]
impl EmotionClassifier for StubClassifier
{   async fn classify(&self, _text: &str)
      -> Result<EmotionResult, Error>
    {   self.log.lock().unwrap().push("classify");
        self.result.clone()
    }
}

/// Records the call, then renders with the real templates
pub struct RecordingPrompts
{   pub log: CallLog
  , pub fail: bool
  , /// Report this mode and template instead of the rendered ones
    pub forced_mode: Option<(Mode, &'static str)>
  , pub seen: Arc<Mutex<Vec<PromptRequest>>>
}

#[async_trait]
impl PromptBuilder for RecordingPrompts
{   async fn build(&self, request: &PromptRequest)
      -> Result<PromptResult, Error>
    {   self.log.lock().unwrap().push("build");
        self.seen.lock().unwrap().push(request.clone());
        if self.fail
        {   return Err(Error::PromptBuild("template store offline".to_string()));
        }
        let mut result = TemplatePromptBuilder::new().build(request).await?;
        if let Some((mode, template)) = self.forced_mode
        {   result.mode = mode;
            result.template_name = template.to_string();
        }
        Ok(result)
    }
}

pub struct StubGenerator
{   pub log: CallLog
  , pub fail: Option<Error>
  , pub delay: Option<Duration>
}

#[async_trait]
impl GenerationClient for StubGenerator
{   fn name(&self) -> &str
    {   "stub"
    }

    async fn generate(&self, request: &GenerateRequest)
      -> Result<GenerationResult, Error>
    {   self.log.lock().unwrap().push("generate");
        if let Some(delay) = self.delay
        {   tokio::time::sleep(delay).await;
        }
        if let Some(e) = &self.fail
        {   return Err(e.clone());
        }
        let mut usage = Usage::new();
        usage.insert("prompt_chars".to_string(), request.prompt.len().into());
        Ok(GenerationResult
        {   text: "I hear you. That sounds hard.".to_string()
          , provider: "stub".to_string()
          , usage
        })
    }
}

/// Audit sink that keeps entries in memory
#[derive(Default)]
pub struct MemoryAudit
{   pub entries: Mutex<Vec<AuditEntry>>
}

impl AuditSink for MemoryAudit
{   fn record(&self, entry: AuditEntry)
    {   self.entries.lock().unwrap().push(entry);
    }
}

pub struct Harness
{   pub log: CallLog
  , pub prompts_seen: Arc<Mutex<Vec<PromptRequest>>>
  , pub orchestrator: FlowOrchestrator
}

pub struct HarnessBuilder
{   classify: Result<EmotionResult, Error>
  , prompt_fails: bool
  , prompt_mode: Option<(Mode, &'static str)>
  , generate_fails: Option<Error>
  , generate_delay: Option<Duration>
  , audit: Arc<dyn AuditSink>
  , timeouts: StageTimeouts
}

impl HarnessBuilder
{   pub fn new() -> Self
    {   HarnessBuilder
        {   classify: Ok(emotion(EmotionLabel::Sad, 0.4, 2))
          , prompt_fails: false
          , prompt_mode: None
          , generate_fails: None
          , generate_delay: None
          , audit: Arc::new(NoopAuditLog)
          , timeouts: StageTimeouts::default()
        }
    }

    pub fn classify(mut self, result: Result<EmotionResult, Error>) -> Self
    {   self.classify = result;
        self
    }

    pub fn prompt_fails(mut self) -> Self
    {   self.prompt_fails = true;
        self
    }

    pub fn prompt_mode(mut self, mode: Mode, template: &'static str) -> Self
    {   self.prompt_mode = Some((mode, template));
        self
    }

    pub fn generate_fails(mut self, e: Error) -> Self
    {   self.generate_fails = Some(e);
        self
    }

    pub fn generate_delay(mut self, delay: Duration) -> Self
    {   self.generate_delay = Some(delay);
        self
    }

    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self
    {   self.audit = audit;
        self
    }

    pub fn timeouts(mut self, timeouts: StageTimeouts) -> Self
    {   self.timeouts = timeouts;
        self
    }

    pub fn build(self) -> Harness
    {   let log = new_log();
        let prompts_seen = Arc::new(Mutex::new(Vec::new()));
        let classifier = Arc::new(StubClassifier
        {   log: log.clone()
          , result: self.classify
        });
        let prompts = Arc::new(RecordingPrompts
        {   log: log.clone()
          , fail: self.prompt_fails
          , forced_mode: self.prompt_mode
          , seen: prompts_seen.clone()
        });
        let generator = Arc::new(StubGenerator
        {   log: log.clone()
          , fail: self.generate_fails
          , delay: self.generate_delay
        });
        let orchestrator = FlowOrchestrator::new(
          classifier
        , prompts
        , PrimaryThenFallbackGenerator::new(generator)
        , self.audit
        , self.timeouts
        );
        Harness
        {   log
          , prompts_seen
          , orchestrator
        }
    }
}
