//! Failover from a primary provider to the mock generator

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::Value;
use log::{debug, warn};
use crate::providers::{GenerationClient, MockProvider};
use crate::request::{GenerateRequest, GenerationResult};

/// Usage key holding the primary's failure text
pub const USAGE_ERROR_KEY: &str = "error";
/// Usage key holding the provider that was asked first
pub const USAGE_FALLBACK_FROM_KEY: &str = "fallbackFrom";

/// Which strategy served a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served
{   Primary
  , Fallback
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tagged
{   pub served: Served
  , pub result: GenerationResult
}

/// Two-step strategy: try the primary once; on any failure try
/// the fallback once and annotate its usage with the reason.
pub struct PrimaryThenFallbackGenerator
{   primary: Arc<dyn GenerationClient>
  , fallback: Arc<dyn GenerationClient>
  , primary_timeout: Option<Duration>
}

impl PrimaryThenFallbackGenerator
{   /// Wrap `primary` with the mock generator as fallback
    pub fn new(primary: Arc<dyn GenerationClient>) -> Self
    {   debug!(
          "Creating fallback chain: {} -> {}",
          primary.name(), MockProvider::NAME
        );
        PrimaryThenFallbackGenerator
        {   primary
          , fallback: Arc::new(MockProvider::new())
          , primary_timeout: None
        }
    }

    pub fn with_fallback(
      mut self
    , fallback: Arc<dyn GenerationClient>
    ) -> Self
    {   self.fallback = fallback;
        self
    }

    /// Give up on the primary after `timeout` and fall back
    pub fn with_primary_timeout(mut self, timeout: Duration) -> Self
    {   self.primary_timeout = Some(timeout);
        self
    }

    async fn call_primary(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>
    {   let result = match self.primary_timeout
        {   Some(limit) => {
              tokio::time::timeout(limit, self.primary.generate(request))
                .await
                .map_err(|_| {
                  crate::error::Error::Timeout(
                    format!("{} generation", self.primary.name())
                  )
                })??
            }
          , None => self.primary.generate(request).await?
        };
        if result.text.trim().is_empty()
        {   return Err(crate::error::Error::ApiError(
              format!("{} returned empty text", result.provider)
            ));
        }
        Ok(result)
    }

    pub async fn generate_tagged(
      &self
    , request: &GenerateRequest
    ) -> Result<Tagged, crate::error::Error>
    {   let primary_err = match self.call_primary(request).await
        {   Ok(result) => {
              return Ok(Tagged
              {   served: Served::Primary
                , result
              });
            }
          , Err(e) => e
        };

        let requested = request.provider_override
          .clone()
          .filter(|name| !name.trim().is_empty())
          .unwrap_or_else(|| self.primary.name().to_string());
        warn!(
          "Provider '{}' failed, falling back to {}: {}",
          requested, self.fallback.name(), primary_err
        );

        let mut result = self.fallback.generate(request).await?;
        result.usage.insert(
          USAGE_ERROR_KEY.to_string(),
          Value::String(primary_err.to_string())
        );
        result.usage.insert(
          USAGE_FALLBACK_FROM_KEY.to_string(),
          Value::String(requested)
        );
        Ok(Tagged
        {   served: Served::Fallback
          , result
        })
    }
}

#[async_trait]
impl GenerationClient for PrimaryThenFallbackGenerator
{   fn name(&self) -> &str
    {   self.primary.name()
    }

    async fn generate(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>
    {   self.generate_tagged(request).await.map(|tagged| tagged.result)
    }
}
