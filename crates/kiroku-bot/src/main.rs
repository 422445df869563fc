use std::sync::Arc;

use tracing::info;

use kiroku_core::config::KirokuConfig;
use kiroku_discord::DiscordAdapter;
use kiroku_knowledge::KnowledgeConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiroku_bot=info,kiroku_discord=info,kiroku_knowledge=info".into()),
        )
        .init();

    // load config: KIROKU_CONFIG path > ./kiroku.toml, with KIROKU_* env overrides
    let config_path = std::env::var("KIROKU_CONFIG").ok();
    let config = KirokuConfig::load(config_path.as_deref())?;

    if config.test_mode {
        info!("test_mode enabled: summarizer calls are stubbed locally");
    }

    let connector = Arc::new(KnowledgeConnector::new(
        config.openai.clone(),
        config.notion.clone(),
        config.test_mode,
    ));

    DiscordAdapter::new(&config.discord, connector).run().await;

    Ok(())
}
