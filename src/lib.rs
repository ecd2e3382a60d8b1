pub mod error;
pub mod config;
pub mod request;
pub mod safety;
pub mod emotion;
pub mod prompt;
pub mod providers;
pub mod failover;
pub mod client;
pub mod audit;
pub mod flows;
pub mod registry;
pub mod server;
use serde::{Deserialize, Serialize};

/*

emoflow turns a free-text emotional statement into a reply:
safety gate -> emotion classifier -> prompt builder -> generation
backend, wrapped in a response envelope that always carries a trace id
and either a message or a structured error.

emoflow/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Shared flow/mode/intensity types
│   ├── main.rs         # HTTP service binary
│   ├── error.rs        # Crate error type
│   ├── config.rs       # Startup configuration
│   ├── request.rs      # Wire types and the response envelope
│   ├── safety.rs       # Denylist gate
│   ├── emotion.rs      # Emotion classifier port + keyword/HTTP impls
│   ├── prompt.rs       # Prompt builder port + template/HTTP impls
│   ├── providers/      # Generation backends (mock, openai, remote)
│   ├── client.rs       # Provider routing by name
│   ├── failover.rs     # Primary-then-fallback generation
│   ├── audit.rs        # No-throw audit log port
│   ├── flows.rs        # Flow orchestrator
│   ├── registry.rs     # Flow name -> routine dispatch
│   └── server.rs       # axum router and handlers
└── tests/

*/

pub use error::Error;
pub use flows::FlowOrchestrator;
pub use registry::FlowRegistry;
pub use request::FlowResponse;

/// EMOFLOW STRUCTURES:

/// Named orchestration routines accepted by the service.
/// The set is closed: anything else is a routing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum FlowName
{   /// Full pipeline: safety, classify, prompt, generate
    #[serde(rename = "chat")]
    Chat
  , /// Scripted box-breathing exercise
    #[serde(rename = "breathing")]
    Breathing
  , /// Scripted facts / emotions / needs worksheet
    #[serde(rename = "thought-clarify")]
    ThoughtClarify
}

impl FlowName
{   pub const ALL: [FlowName; 3] = [
      FlowName::Chat
    , FlowName::Breathing
    , FlowName::ThoughtClarify
    ];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   FlowName::Chat => "chat"
          , FlowName::Breathing => "breathing"
          , FlowName::ThoughtClarify => "thought-clarify"
        }
    }
}

impl std::fmt::Display for FlowName
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowName
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   FlowName::ALL
          .into_iter()
          .find(|flow| flow.as_str() == s)
          .ok_or_else(|| {
            crate::error::Error::UnknownFlow(s.to_string())
          })
    }
}

/// Safety-criticality level. Ordered: `Normal < HighSafety`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode
{   Normal
  , HighSafety
}

impl Mode
{   /// Only the high tier selects `HighSafety`.
    /// Monotonic: a higher tier never yields a less cautious mode.
    pub fn for_intensity(intensity: Intensity) -> Self
    {   match intensity
        {   Intensity::High => Mode::HighSafety
          , Intensity::Medium | Intensity::Low => Mode::Normal
        }
    }

    pub fn suggested_exercise(&self) -> Exercise
    {   match self
        {   Mode::HighSafety => Exercise::Breathing
          , Mode::Normal => Exercise::ThoughtLog
        }
    }

    pub fn as_str(&self) -> &'static str
    {   match self
        {   Mode::Normal => "normal"
          , Mode::HighSafety => "high_safety"
        }
    }
}

/// Intensity tier derived from classifier confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity
{   Low
  , Medium
  , High
}

impl Intensity
{   pub const HIGH_CONFIDENCE: f32 = 0.66;
    pub const MEDIUM_CONFIDENCE: f32 = 0.33;

    /// Bucket a dominant-label confidence into a tier
    pub fn from_confidence(score: f32) -> Self
    {   if score >= Self::HIGH_CONFIDENCE
        {   Intensity::High
        } else if score >= Self::MEDIUM_CONFIDENCE
        {   Intensity::Medium
        } else
        {   Intensity::Low
        }
    }

    /// Map a classifier level onto a tier.
    /// Levels above 3 (a 1-4 scale upstream) stay `High`.
    pub fn from_level(level: u8) -> Self
    {   match level
        {   0 | 1 => Intensity::Low
          , 2 => Intensity::Medium
          , _ => Intensity::High
        }
    }

    /// Discrete level reported by classifiers (1-3)
    pub fn level(&self) -> u8
    {   match self
        {   Intensity::Low => 1
          , Intensity::Medium => 2
          , Intensity::High => 3
        }
    }

    pub fn as_str(&self) -> &'static str
    {   match self
        {   Intensity::Low => "low"
          , Intensity::Medium => "medium"
          , Intensity::High => "high"
        }
    }
}

/// Exercise suggested alongside a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise
{   Breathing
  , Grounding
  , ThoughtLog
}

impl Exercise
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Exercise::Breathing => "breathing"
          , Exercise::Grounding => "grounding"
          , Exercise::ThoughtLog => "thought_log"
        }
    }
}
