//! Discord channel adapter.
//!
//! Wraps a serenity `Client` and drives the event loop until the process
//! exits. Reconnects automatically whenever the gateway drops.

use std::sync::Arc;
use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use kiroku_core::config::DiscordConfig;
use kiroku_knowledge::Knowledge;

use crate::handler::KirokuHandler;

pub struct DiscordAdapter<K: Knowledge + 'static> {
    knowledge: Arc<K>,
    config: DiscordConfig,
}

impl<K: Knowledge + 'static> DiscordAdapter<K> {
    pub fn new(config: &DiscordConfig, knowledge: Arc<K>) -> Self {
        Self {
            knowledge,
            config: config.clone(),
        }
    }

    /// Connect to Discord and keep reconnecting whenever the gateway drops.
    ///
    /// Never returns — runs for the lifetime of the process.
    pub async fn run(self) {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        loop {
            let mut client = loop {
                match self.build_client(intents).await {
                    Ok(c) => break c,
                    Err(e) => {
                        error!("Discord: connect failed ({e}), retrying in 30s");
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            };

            info!("Discord: gateway connecting");

            if let Err(e) = client.start().await {
                warn!("Discord: gateway error ({e}), reconnecting in 5s");
            } else {
                info!("Discord: gateway stopped cleanly, reconnecting in 5s");
            }

            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    /// Build a fresh serenity `Client` with our event handler.
    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, serenity::Error> {
        let handler = KirokuHandler {
            knowledge: Arc::clone(&self.knowledge),
        };

        Client::builder(&self.config.bot_token, intents)
            .event_handler(handler)
            .await
    }
}
