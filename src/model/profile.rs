use serde::{Deserialize, Serialize};

pub const MIN_USERNAME_LEN: usize = 3;

/// Who is playing and which key pays for the generations.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(rename = "apikey")]
    pub api_key: String,
}

impl Profile {
    /// Trim and check the fields captured on the setup screen.
    pub fn new(username: &str, api_key: &str) -> Result<Self, String> {
        let username = username.trim();
        let api_key = api_key.trim();

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters"
            ));
        }
        if api_key.is_empty() {
            return Err("API key is required".into());
        }

        Ok(Self {
            username: username.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

// Keep the key out of logs.
impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
