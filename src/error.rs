use std::fmt;

/// Custom error type for emoflow operations
/// Implements Clone so collaborator failures can be
/// copied into response envelopes and audit lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Request text was empty or whitespace
    InvalidInput(String)
  , /// Flow name outside the fixed flow set
    UnknownFlow(String)
  , /// Emotion classifier failed
    Classification(String)
  , /// Prompt builder failed
    PromptBuild(String)
  , /// API key is missing for a provider
    MissingApiKey(String)
  , /// Provider known but not available in this build
    ProviderNotImplemented(String)
  , /// Provider name not recognised
    UnknownProvider(String)
  , /// HTTP request error
    HttpError(String)
  , /// API returned an error response
    ApiError(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// No choices in API response
    NoChoicesInResponse
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// A pipeline stage did not finish in time
    Timeout(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Machine-readable code surfaced in the response envelope
    pub fn code(&self) -> crate::request::ErrorCode
    {   match self
        {   Error::InvalidInput(_) => {
              crate::request::ErrorCode::InvalidInput
            }
          , _ => crate::request::ErrorCode::InternalError
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidInput(msg) => {
              write!(f, "Invalid input: {}", msg)
            }
          , Error::UnknownFlow(name) => {
              write!(f, "Unknown flow: {}", name)
            }
          , Error::Classification(msg) => {
              write!(f, "Emotion classification failed: {}", msg)
            }
          , Error::PromptBuild(msg) => {
              write!(f, "Prompt building failed: {}", msg)
            }
          , Error::MissingApiKey(provider) => {
              write!(f, "Missing API key for: {}", provider)
            }
          , Error::ProviderNotImplemented(provider) => {
              write!(f,
                "Provider not yet implemented: {}",
                provider
              )
            }
          , Error::UnknownProvider(provider) => {
              write!(f, "Unknown provider '{}'", provider)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "API error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse => {
              write!(f, "API response contained no choices")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout(stage) => {
              write!(f, "{} timed out", stage)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout("HTTP request".to_string())
        } else if e.is_decode()
        {   Error::ParseError(e.to_string())
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}
