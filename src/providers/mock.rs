use async_trait::async_trait;
use serde_json::json;
use log::debug;
use crate::request::{GenerateRequest, GenerationResult, Usage};

const PREVIEW_CHARS: usize = 120;
const MAX_REPLY_CHARS: usize = 512;
const ELLIPSIS: &str = "...";

/// Deterministic, dependency-free generator.
/// Echoes the first line of the prompt; never fails.
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider
{   pub const NAME: &'static str = "mock";

    pub fn new() -> Self
    {   MockProvider
    }

    pub fn reply_for(&self, prompt: &str) -> String
    {   let preview: String = prompt
          .trim()
          .lines()
          .next()
          .unwrap_or("")
          .chars()
          .take(PREVIEW_CHARS)
          .collect();
        shorten(
          &format!("(mock) Notional model reply based on: {}", preview),
          MAX_REPLY_CHARS
        )
    }

    pub fn usage_for(&self, prompt: &str) -> Usage
    {   let prompt_tokens = prompt.split_whitespace().count();
        let mut usage = Usage::new();
        usage.insert("prompt_tokens".to_string(), json!(prompt_tokens));
        usage.insert("completion_tokens".to_string(), json!(0));
        usage.insert("total_tokens".to_string(), json!(prompt_tokens));
        usage
    }
}

#[async_trait]
impl super::GenerationClient for MockProvider
{   fn name(&self) -> &str
    {   Self::NAME
    }

    async fn generate(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>
    {   debug!("Mock generation for {} prompt chars", request.prompt.len());
        Ok(GenerationResult
        {   text: self.reply_for(&request.prompt)
          , provider: Self::NAME.to_string()
          , usage: self.usage_for(&request.prompt)
        })
    }
}

/// Collapse whitespace and cut at a word boundary so the
/// result, ellipsis included, fits in `width` chars.
fn shorten(text: &str, width: usize) -> String
{   let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width
    {   return collapsed;
    }
    let budget = width.saturating_sub(ELLIPSIS.len());
    let mut out = String::new();
    for word in words
    {   let sep = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + sep + word.chars().count() > budget
        {   break;
        }
        if sep == 1
        {   out.push(' ');
        }
        out.push_str(word);
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_shorten_keeps_short_text()
    {   assert_eq!(shorten("a   b\n c", 20), "a b c");
    }

    #[test]
    fn test_shorten_cuts_at_word_boundary()
    {   let out = shorten("alpha beta gamma delta", 14);
        assert_eq!(out, "alpha beta...");
        assert!(out.chars().count() <= 14);
    }

    #[test]
    fn test_reply_uses_first_prompt_line()
    {   let reply = MockProvider::new()
          .reply_for("  First line here\nsecond line");
        assert_eq!(
          reply,
          "(mock) Notional model reply based on: First line here"
        );
    }
}
