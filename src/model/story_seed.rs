use serde::{Deserialize, Serialize};

/// The premise a session starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorySeed {
    pub title: String,
    pub plot: String,
    /// Cover image shown until a beat brings its own.
    pub image_url: Option<String>,
    /// Number of player choices before a conclusion is requested.
    pub max_choices: u32,
}

impl Default for StorySeed {
    fn default() -> Self {
        Self {
            title: "On Galaxy's Edge".into(),
            plot: "You are an intergalactic space traveler who has discovered teleportation technology."
                .into(),
            image_url: Some(
                "https://pathfinder-prototype.netlify.app/assets/on-galaxys-edge-variant-4-61f553b7.png"
                    .into(),
            ),
            max_choices: 3,
        }
    }
}
