use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level config (kiroku.toml + KIROKU_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KirokuConfig {
    pub discord: DiscordConfig,
    pub openai: OpenAiConfig,
    pub notion: NotionConfig,
    /// When true, the summarizer returns a deterministic local stand-in
    /// and never touches the network.
    #[serde(default)]
    pub test_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_notion_base_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl KirokuConfig {
    /// Load config from a TOML file with KIROKU_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./kiroku.toml
    ///
    /// Env keys use `__` as the section separator, e.g.
    /// `KIROKU_DISCORD__BOT_TOKEN` overrides `[discord] bot_token`.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or("kiroku.toml");

        let config: KirokuConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("KIROKU_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "kiroku.toml",
                r#"
                [discord]
                bot_token = "t"

                [openai]
                api_key = "k1"

                [notion]
                api_key = "k2"
                database_id = "db"
                "#,
            )?;

            let config = KirokuConfig::load(None).expect("load");
            assert_eq!(config.openai.base_url, "https://api.openai.com");
            assert_eq!(config.openai.model, "gpt-3.5-turbo");
            assert_eq!(config.notion.base_url, "https://api.notion.com");
            assert!(!config.test_mode);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "kiroku.toml",
                r#"
                test_mode = false

                [discord]
                bot_token = "t"

                [openai]
                api_key = "k1"

                [notion]
                api_key = "k2"
                database_id = "db"
                "#,
            )?;
            jail.set_env("KIROKU_TEST_MODE", "true");
            jail.set_env("KIROKU_OPENAI__MODEL", "gpt-4o-mini");

            let config = KirokuConfig::load(None).expect("load");
            assert!(config.test_mode);
            assert_eq!(config.openai.model, "gpt-4o-mini");
            Ok(())
        });
    }

    #[test]
    fn missing_required_key_is_an_error() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "kiroku.toml",
                r#"
                [discord]
                bot_token = "t"
                "#,
            )?;

            assert!(KirokuConfig::load(None).is_err());
            Ok(())
        });
    }
}
