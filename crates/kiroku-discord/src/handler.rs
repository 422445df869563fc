//! Discord message handler: parse the entry, orchestrate the knowledge
//! connector, reply with the outcome.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use kiroku_knowledge::Knowledge;

use crate::parse::parse_entry;

/// Reply when the message is missing either labeled field.
pub const USAGE_MESSAGE: &str =
    "❌ 入力形式が正しくありません。\n例:\n分類: 学習\nやったこと: Node.jsの非同期処理を学んだ";

/// Reply when a downstream call fails.
pub const FAILURE_MESSAGE: &str = "⚠️ 登録中にエラーが発生しました。コンソールを確認してください。";

/// What the handler does on the origin channel after processing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this text back to the channel.
    Reply(String),
    /// Send nothing (duplicate entry).
    Silent,
}

/// Process one message body end to end.
///
/// Parse → duplicate check → summarize → create record, strictly
/// sequential. Duplicates are logged and dropped without a reply, so a
/// re-submitted entry does not produce a noisy notification. Downstream
/// failures are logged and turned into the fixed failure reply; there is
/// no retry.
pub async fn handle_entry<K: Knowledge + ?Sized>(body: &str, knowledge: &K) -> Outcome {
    let Some(entry) = parse_entry(body) else {
        return Outcome::Reply(USAGE_MESSAGE.to_string());
    };

    let exists = match knowledge.record_exists(&entry.detail).await {
        Ok(exists) => exists,
        Err(e) => {
            warn!(error = %e, "duplicate check failed");
            return Outcome::Reply(FAILURE_MESSAGE.to_string());
        }
    };

    if exists {
        info!(category = %entry.category, "entry already recorded, skipping");
        return Outcome::Silent;
    }

    let summary = match knowledge.summarize(&entry.detail).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "summarize failed");
            return Outcome::Reply(FAILURE_MESSAGE.to_string());
        }
    };

    if let Err(e) = knowledge
        .create_record(&summary, &entry.detail, &entry.category)
        .await
    {
        warn!(error = %e, "record create failed");
        return Outcome::Reply(FAILURE_MESSAGE.to_string());
    }

    Outcome::Reply(format!("✅ Notionに登録しました！\n📝 要約: {summary}"))
}

/// Serenity event handler wired to the knowledge connector.
pub struct KirokuHandler<K: Knowledge + 'static> {
    pub knowledge: Arc<K>,
}

#[async_trait]
impl<K: Knowledge + 'static> EventHandler for KirokuHandler<K> {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(name = %ready.user.name, "Discord bot connected");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Never react to bot authors, including ourselves.
        if msg.author.bot {
            return;
        }

        match handle_entry(msg.content.trim(), self.knowledge.as_ref()).await {
            Outcome::Reply(text) => {
                if let Err(e) = msg.reply(&ctx.http, text).await {
                    warn!(error = %e, "Discord reply failed");
                }
            }
            Outcome::Silent => {}
        }
    }
}
