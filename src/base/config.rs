//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use chrono_tz::Tz;
use serde::Deserialize;

use super::types::Res;

/// Default OpenAI model to use.
fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature; extraction wants deterministic output.
fn default_openai_temperature() -> f32 {
    0.0
}

/// Default max output tokens for OpenAI model.
fn default_openai_max_tokens() -> u32 {
    2048
}

/// Default upper bound on a single completion call, in seconds.
fn default_openai_timeout_secs() -> u64 {
    60
}

/// Default channel the bot listens in.
fn default_bind_channel_name() -> String {
    "eventbot".to_string()
}

/// Default display timezone.
fn default_timezone() -> String {
    "UTC".to_string()
}

/// Configuration for the event-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The shared configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Configuration values, shared behind [`Config`].
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: String,
    /// OpenAI model to use (`OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Sampling temperature to use for the OpenAI model (`OPENAI_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Max output tokens for OpenAI model (`OPENAI_MAX_TOKENS`).
    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,
    /// Timeout for a single completion call, in seconds (`OPENAI_TIMEOUT_SECS`).
    #[serde(default = "default_openai_timeout_secs")]
    pub openai_timeout_secs: u64,
    /// Slack app token (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Name of the channel in which the bot listens (`BIND_CHANNEL_NAME`).
    #[serde(default = "default_bind_channel_name")]
    pub bind_channel_name: String,
    /// IANA timezone used to render times (`TIMEZONE`), e.g. `America/New_York`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Directory holding `prompt-create-event.txt` and `proposed-event.md` (`TEMPLATE_DIR`).
    /// The embedded templates are used when unset.
    #[serde(default)]
    pub template_dir: Option<String>,
    /// Fail requests whose completion is not a JSON payload at all (`STRICT_PAYLOAD_DECODING`).
    #[serde(default)]
    pub strict_payload_decoding: bool,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_model: default_openai_model(),
            openai_temperature: default_openai_temperature(),
            openai_max_tokens: default_openai_max_tokens(),
            openai_timeout_secs: default_openai_timeout_secs(),
            slack_app_token: String::new(),
            slack_bot_token: String::new(),
            bind_channel_name: default_bind_channel_name(),
            timezone: default_timezone(),
            template_dir: None,
            strict_payload_decoding: false,
        }
    }
}

impl ConfigInner {
    /// The display timezone, parsed.
    pub fn tz(&self) -> Res<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| anyhow::anyhow!("Invalid timezone `{}`: {e}", self.timezone))
    }
}

impl Config {
    /// Load configuration from the environment (`EVENT_BOT_*`) and an optional TOML file.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("EVENT_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Res<()> {
        if self.openai_temperature < 0.0 || self.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if self.openai_max_tokens < 1 || self.openai_max_tokens > 128000 {
            return Err(anyhow::anyhow!("OpenAI max tokens must be between 1 and 128000."));
        }

        if self.openai_timeout_secs == 0 {
            return Err(anyhow::anyhow!("OpenAI timeout must be at least one second."));
        }

        if self.bind_channel_name.trim().is_empty() {
            return Err(anyhow::anyhow!("Bind channel name must not be empty."));
        }

        self.tz()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(inner: ConfigInner) -> Config {
        Config { inner: Arc::new(inner) }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = config_with(ConfigInner::default());

        assert!(config.validate().is_ok());
        assert_eq!(config.tz().unwrap(), Tz::UTC);
        assert_eq!(config.bind_channel_name, "eventbot");
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let config = config_with(ConfigInner {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        });

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let hot = config_with(ConfigInner {
            openai_temperature: 2.5,
            ..Default::default()
        });
        assert!(hot.validate().is_err());

        let no_timeout = config_with(ConfigInner {
            openai_timeout_secs: 0,
            ..Default::default()
        });
        assert!(no_timeout.validate().is_err());

        let no_channel = config_with(ConfigInner {
            bind_channel_name: "  ".to_string(),
            ..Default::default()
        });
        assert!(no_channel.validate().is_err());
    }

    #[test]
    fn test_parses_iana_timezone() {
        let config = config_with(ConfigInner {
            timezone: "America/New_York".to_string(),
            ..Default::default()
        });

        assert_eq!(config.tz().unwrap(), chrono_tz::America::New_York);
    }
}
