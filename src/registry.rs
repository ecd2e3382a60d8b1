//! Flow name -> orchestration routine

use std::sync::Arc;
use log::debug;
use crate::flows::FlowOrchestrator;
use crate::request::FlowResponse;
use crate::FlowName;

/// Dispatches the fixed flow set `chat`, `breathing`,
/// `thought-clarify` to the orchestrator.
#[derive(Clone)]
pub struct FlowRegistry
{   orchestrator: Arc<FlowOrchestrator>
}

impl FlowRegistry
{   pub fn new(orchestrator: Arc<FlowOrchestrator>) -> Self
    {   FlowRegistry
        {   orchestrator
        }
    }

    pub fn orchestrator(&self) -> &FlowOrchestrator
    {   &self.orchestrator
    }

    /// Names accepted by [`FlowRegistry::dispatch_named`]
    pub fn flows(&self) -> &'static [FlowName]
    {   &FlowName::ALL
    }

    pub async fn dispatch(
      &self
    , flow: FlowName
    , text: &str
    ) -> FlowResponse
    {   debug!("Dispatching flow: {}", flow);
        match flow
        {   FlowName::Chat => self.orchestrator.chat(text).await
          , FlowName::Breathing => self.orchestrator.breathing(text)
          , FlowName::ThoughtClarify => {
              self.orchestrator.thought_clarify(text)
            }
        }
    }

    /// Envelope for a body that could not be read as a request
    pub fn reject(&self, flow: FlowName, detail: String) -> FlowResponse
    {   self.orchestrator.reject(flow, detail)
    }

    /// Parse the flow name first; unknown names never reach
    /// the orchestrator.
    pub async fn dispatch_named(
      &self
    , flow: &str
    , text: &str
    ) -> Result<FlowResponse, crate::error::Error>
    {   let flow: FlowName = flow.parse()?;
        Ok(self.dispatch(flow, text).await)
    }
}
