//! Emotion classification port and its implementations

use std::collections::BTreeMap;
use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, error, trace};
use crate::Intensity;

/// Fixed label set, declared in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel
{   Anxious
  , Angry
  , Sad
  , Tired
  , Neutral
}

impl EmotionLabel
{   pub const ALL: [EmotionLabel; 5] = [
      EmotionLabel::Anxious
    , EmotionLabel::Angry
    , EmotionLabel::Sad
    , EmotionLabel::Tired
    , EmotionLabel::Neutral
    ];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   EmotionLabel::Anxious => "anxious"
          , EmotionLabel::Angry => "angry"
          , EmotionLabel::Sad => "sad"
          , EmotionLabel::Tired => "tired"
          , EmotionLabel::Neutral => "neutral"
        }
    }
}

impl std::fmt::Display for EmotionLabel
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult
{   #[serde(alias = "emotion")]
    pub label: EmotionLabel
  , /// Discrete level: 1-3 from confidence buckets,
    /// upstream classifiers may report up to 4
    pub intensity: u8
  , #[serde(default)]
    pub scores: BTreeMap<EmotionLabel, f32>
}

impl EmotionResult
{   /// Build a result whose label and level follow from `scores`
    pub fn from_scores(scores: BTreeMap<EmotionLabel, f32>) -> Self
    {   let (label, score) = dominant(&scores);
        EmotionResult
        {   label
          , intensity: Intensity::from_confidence(score).level()
          , scores
        }
    }

    /// Score the classifier gave its own label
    pub fn label_score(&self) -> f32
    {   self.scores.get(&self.label).copied().unwrap_or(0.0)
    }

    pub fn tier(&self) -> Intensity
    {   Intensity::from_level(self.intensity)
    }
}

/// Highest score wins; ties go to the earliest label in
/// [`EmotionLabel::ALL`]. Empty scores read as neutral.
pub fn dominant(
  scores: &BTreeMap<EmotionLabel, f32>
) -> (EmotionLabel, f32)
{   let mut best: Option<(EmotionLabel, f32)> = None;
    for (label, score) in scores
    {   match best
        {   Some((_, top)) if *score <= top => {}
          , _ => best = Some((*label, *score))
        }
    }
    best.unwrap_or((EmotionLabel::Neutral, 0.0))
}

/// Maps text to a label, a level and per-label scores
#[async_trait]
pub trait EmotionClassifier: Send + Sync
{   async fn classify(
      &self
    , text: &str
    ) -> Result<EmotionResult, crate::error::Error>;
}

// ===== Keyword heuristics =====

const KEYWORDS: [(EmotionLabel, &[&str]); 4] = [
  ( EmotionLabel::Anxious
  , &[ "anxious", "anxiety", "worried", "worry", "nervous"
     , "scared", "afraid", "panic", "overwhelmed", "stressed"
     ]
  )
, ( EmotionLabel::Angry
  , &[ "angry", "mad", "furious", "annoyed", "frustrated"
     , "irritated", "hate", "rage", "unfair"
     ]
  )
, ( EmotionLabel::Sad
  , &[ "sad", "down", "depressed", "lonely", "cry"
     , "crying", "hopeless", "lost", "grief", "miss"
     ]
  )
, ( EmotionLabel::Tired
  , &[ "tired", "exhausted", "sleepy", "drained", "burnout"
     , "fatigue", "fatigued", "worn", "weary"
     ]
  )
];

const AMPLIFIERS: [&str; 8] = [
  "very", "so", "extremely", "really", "too", "can't", "cannot", "completely"
];

const HIT_WEIGHT: f32 = 0.3;
const AMPLIFIER_WEIGHT: f32 = 0.15;
const AMPLIFIER_CAP: f32 = 0.3;
const NEUTRAL_BASELINE: f32 = 0.3;

/// Dependency-free classifier over the fixed label set.
/// Each keyword hit adds weight to its label; amplifiers boost
/// every label that was hit. Text with no hits is neutral at
/// low confidence.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier
{   pub fn new() -> Self
    {   KeywordClassifier
    }

    pub fn score(&self, text: &str) -> BTreeMap<EmotionLabel, f32>
    {   let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
          .split(|c: char| !(c.is_alphanumeric() || c == '\''))
          .filter(|t| !t.is_empty())
          .collect();

        let boost = (tokens
          .iter()
          .filter(|t| AMPLIFIERS.contains(*t))
          .count() as f32 * AMPLIFIER_WEIGHT)
          .min(AMPLIFIER_CAP);

        let mut scores: BTreeMap<EmotionLabel, f32> = EmotionLabel::ALL
          .iter()
          .map(|label| (*label, 0.0))
          .collect();

        let mut any_hit = false;
        for (label, words) in KEYWORDS.iter()
        {   let hits = tokens
              .iter()
              .filter(|t| words.contains(*t))
              .count();
            if hits > 0
            {   any_hit = true;
                let score = (hits as f32 * HIT_WEIGHT + boost).min(1.0);
                scores.insert(*label, score);
            }
        }
        if !any_hit
        {   scores.insert(EmotionLabel::Neutral, NEUTRAL_BASELINE);
        }
        trace!("Keyword scores: {:?}", scores);
        scores
    }
}

#[async_trait]
impl EmotionClassifier for KeywordClassifier
{   async fn classify(
      &self
    , text: &str
    ) -> Result<EmotionResult, crate::error::Error>
    {   let result = EmotionResult::from_scores(self.score(text));
        debug!(
          "Classified as {} (level {})",
          result.label, result.intensity
        );
        Ok(result)
    }
}

// ===== Remote classifier =====

/// Calls `POST {base_url}/classify` on an emotion service
pub struct HttpEmotionClassifier
{   base_url: String
  , http_client: reqwest::Client
}

impl HttpEmotionClassifier
{   pub fn new(
      base_url: &str
    , timeout: Duration
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating HttpEmotionClassifier for {}", base_url);
        let http_client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(HttpEmotionClassifier
        {   base_url: base_url.trim_end_matches('/').to_string()
          , http_client
        })
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier
{   async fn classify(
      &self
    , text: &str
    ) -> Result<EmotionResult, crate::error::Error>
    {   let body = crate::request::ChatRequest::new(text);
        let response = self.http_client
          .post(format!("{}/classify", self.base_url))
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("Emotion service unreachable: {}", e);
            crate::error::Error::Classification(e.to_string())
          })?;

        let status = response.status();
        trace!("Emotion service status: {}", status);
        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Emotion service error: {}", error_text);
            return Err(crate::error::Error::Classification(
              format!("{}: {}", status, error_text)
            ));
        }

        response.json::<EmotionResult>().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::Classification(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_dominant_breaks_ties_by_label_order()
    {   let scores: BTreeMap<EmotionLabel, f32> = [
          (EmotionLabel::Tired, 0.5)
        , (EmotionLabel::Angry, 0.5)
        , (EmotionLabel::Neutral, 0.1)
        ].into_iter().collect();
        assert_eq!(dominant(&scores), (EmotionLabel::Angry, 0.5));
    }

    #[test]
    fn test_dominant_of_empty_is_neutral()
    {   assert_eq!(
          dominant(&BTreeMap::new()),
          (EmotionLabel::Neutral, 0.0)
        );
    }

    #[test]
    fn test_keyword_scores_cover_every_label()
    {   let scores = KeywordClassifier::new().score("hello there");
        assert_eq!(scores.len(), EmotionLabel::ALL.len());
        assert_eq!(scores[&EmotionLabel::Neutral], NEUTRAL_BASELINE);
    }
}
