//! Generation backends

pub mod mock;
pub mod openai;
pub mod remote;

use async_trait::async_trait;
use crate::request::{GenerateRequest, GenerationResult};

// Re-export for convenience
pub use mock::MockProvider;
pub use openai::OpenAiCompatibleClient;
pub use remote::RemoteGenerationClient;

/// Sends a prompt to a backend and returns generated text
#[async_trait]
pub trait GenerationClient: Send + Sync
{   /// Provider name reported in results and fallback markers
    fn name(&self) -> &str;

    async fn generate(
      &self
    , request: &GenerateRequest
    ) -> Result<GenerationResult, crate::error::Error>;
}
