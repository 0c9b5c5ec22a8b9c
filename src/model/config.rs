use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::story_seed::StorySeed;

/// How the transcript is wrapped when posted to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStyle {
    /// OpenAI-compatible `{model, messages, temperature}` body with bearer auth.
    ChatCompletions,
    /// The bare message array, for a proxy that holds its own credentials.
    Relay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub style: RequestStyle,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".into(),
            style: RequestStyle::ChatCompletions,
            model: "gpt-3.5-turbo".into(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub story: StorySeed,
    /// Name of the stored profile entry.
    pub profile_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            story: StorySeed::default(),
            profile_key: "pathfinder-ver1".into(),
        }
    }
}

impl AppConfig {
    /// Clamp values the engine cannot work with.
    pub fn sanitized(mut self) -> Self {
        if self.story.max_choices == 0 {
            warn!("story.max_choices must be at least 1, using 1");
            self.story.max_choices = 1;
        }
        if self.endpoint.timeout_secs == 0 {
            let fallback = EndpointConfig::default().timeout_secs;
            warn!("endpoint.timeout_secs must be positive, using {fallback}");
            self.endpoint.timeout_secs = fallback;
        }
        if self.profile_key.trim().is_empty() {
            self.profile_key = AppConfig::default().profile_key;
        }
        self
    }
}
