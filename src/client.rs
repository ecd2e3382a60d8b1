//! Provider routing: picks a generation backend by name

use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use crate::providers::{
  GenerationClient, MockProvider, OpenAiCompatibleClient, RemoteGenerationClient
};
use crate::request::{GenerateRequest, GenerationResult};

/// Backends reachable by provider name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind
{   Mock
  , /// openai | deepseek | api
    OpenAiCompatible
  , /// gateway | remote
    Gateway
  , /// local | tiny | tiny-local: needs an on-device model
    Local
}

impl ProviderKind
{   /// Case-insensitive name lookup
    pub fn resolve(name: &str)
      -> Result<Self, crate::error::Error>
    {   match name.trim().to_lowercase().as_str()
        {   "mock" => Ok(ProviderKind::Mock)
          , "openai" | "deepseek" | "api" => {
              Ok(ProviderKind::OpenAiCompatible)
            }
          , "gateway" | "remote" => Ok(ProviderKind::Gateway)
          , "local" | "tiny" | "tiny-local" => Ok(ProviderKind::Local)
          , other => Err(crate::error::Error::UnknownProvider(
              other.to_string()
            ))
        }
    }
}

/// Routes each request to the configured provider, or to
/// the request's `providerOverride` when one is given.
/// Failures are returned as-is; see `failover` for recovery.
pub struct ProviderRouter
{   default_provider: String
  , mock: MockProvider
  , api: OpenAiCompatibleClient
  , gateway: Option<RemoteGenerationClient>
}

impl ProviderRouter
{   pub fn from_config(
      config: &crate::config::GenerationConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating ProviderRouter, default: {}", config.provider);
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let api = OpenAiCompatibleClient::new(
          "openai"
        , config.api_key.clone()
        , config.base_url.clone()
        , &config.api_model
        , timeout
        )?;
        let gateway = match &config.gateway_url
        {   Some(url) => Some(RemoteGenerationClient::new(url, timeout)?)
          , None => None
        };
        Ok(ProviderRouter
        {   default_provider: config.provider.clone()
          , mock: MockProvider::new()
          , api
          , gateway
        })
    }

    fn requested<'a>(&'a self, request: &'a GenerateRequest) -> &'a str
    {   request.provider_override
          .as_deref()
          .filter(|name| !name.trim().is_empty())
          .unwrap_or(self.default_provider.as_str())
    }
}

#[async_trait]
impl GenerationClient for ProviderRouter
{   fn name(&self) -> &str
    {   &self.default_provider
    }

    async fn generate(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>
    {   let name = self.requested(request);
        debug!("Routing generation to provider: {}", name);
        match ProviderKind::resolve(name)?
        {   ProviderKind::Mock => self.mock.generate(request).await
          , ProviderKind::OpenAiCompatible => {
              self.api.generate(request).await
            }
          , ProviderKind::Gateway => match &self.gateway
            {   Some(gateway) => gateway.generate(request).await
              , None => {
                  error!("Gateway provider requested without a URL");
                  Err(crate::error::Error::InvalidConfiguration(
                    "LLM_GATEWAY_URL is not set".to_string()
                  ))
                }
            }
          , ProviderKind::Local => {
              Err(crate::error::Error::ProviderNotImplemented(
                name.to_string()
              ))
            }
        }
    }
}
