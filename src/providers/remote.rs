use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, trace};
use crate::request::{GenerateRequest, GenerationResult};

/// Forwards to another service's `POST {base_url}/generate`
pub struct RemoteGenerationClient
{   base_url: String
  , http_client: reqwest::Client
}

impl RemoteGenerationClient
{   pub const NAME: &'static str = "gateway";

    pub fn new(
      base_url: &str
    , timeout: Duration
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating RemoteGenerationClient for {}", base_url);
        let http_client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(RemoteGenerationClient
        {   base_url: base_url.trim_end_matches('/').to_string()
          , http_client
        })
    }
}

#[async_trait]
impl super::GenerationClient for RemoteGenerationClient
{   fn name(&self) -> &str
    {   Self::NAME
    }

    async fn generate(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>
    {   // the remote side picks its own provider
        let body = GenerateRequest
        {   prompt: request.prompt.clone()
          , max_tokens: request.max_tokens
          , provider_override: None
        };

        let response = self.http_client
          .post(format!("{}/generate", self.base_url))
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("Generation service unreachable: {}", e);
            crate::error::Error::from(e)
          })?;

        let status = response.status();
        trace!("Generation service status: {}", status);
        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Generation service error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              format!("{}: {}", status, error_text)
            ));
        }

        response.json::<GenerationResult>().await.map_err(|e| {
          error!("Parse error: {}", e);
          crate::error::Error::ParseError(e.to_string())
        })
    }
}
