use std::sync::Arc;
use log::{error, info};
use emoflow::config::OrchestratorConfig;
use emoflow::{FlowOrchestrator, FlowRegistry};

#[tokio::main]
async fn main()
{   env_logger::init();

    if let Err(e) = run().await
    {   error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), emoflow::Error>
{   let config = OrchestratorConfig::from_env()?;
    info!(
      "Starting emoflow: provider={}, classifier={}, prompts={}",
      config.generation.provider,
      config.services.emotion_url.as_deref().unwrap_or("keyword"),
      config.services.prompt_url.as_deref().unwrap_or("templates")
    );

    let orchestrator = Arc::new(FlowOrchestrator::from_config(&config)?);
    let registry = FlowRegistry::new(orchestrator);
    let router = emoflow::server::build_router(registry);

    emoflow::server::serve(router, &config.server.host, config.server.port)
      .await
}
