use crate::engine::session::{GameSession, Phase};
use crate::model::story_node::StoryNode;

/// Everything the presentation layer needs to draw one frame of the story.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryView {
    pub title: String,
    pub plot: String,
    pub image_url: Option<String>,
    pub choices: Vec<String>,
    pub generating: bool,
    pub started: bool,
    pub is_ending: bool,
    pub ending_text: Option<String>,
    pub choice_count: u32,
    pub max_choices: u32,
    pub error: Option<String>,
    pub can_retry: bool,
    pub history: Vec<StoryNode>,
}

impl StoryView {
    /// Share of the story completed, in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.max_choices == 0 {
            return 0.0;
        }
        (self.choice_count as f32 / self.max_choices as f32).clamp(0.0, 1.0)
    }
}

impl From<&GameSession> for StoryView {
    fn from(session: &GameSession) -> Self {
        let seed = session.seed();
        let current = session.current();

        let plot = current
            .map(|n| n.plot.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| seed.plot.clone());

        Self {
            title: seed.title.clone(),
            plot,
            image_url: current
                .and_then(|n| n.image_url.clone())
                .or_else(|| seed.image_url.clone()),
            choices: current.map(|n| n.choices.clone()).unwrap_or_default(),
            generating: session.generating(),
            started: session.phase() != Phase::NotStarted,
            is_ending: current.is_some_and(|n| n.is_ending),
            ending_text: current.and_then(|n| n.ending_text.clone()),
            choice_count: session.choice_count(),
            max_choices: session.max_choices(),
            error: session.last_error().map(str::to_string),
            can_retry: session.can_retry(),
            history: session.history().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::session::PlayerAction;
    use crate::model::message::Message;
    use crate::model::story_seed::StorySeed;

    #[test]
    fn fresh_session_shows_seed() {
        let seed = StorySeed::default();
        let view = GameSession::new(seed.clone()).view();

        assert_eq!(view.title, seed.title);
        assert_eq!(view.plot, seed.plot);
        assert_eq!(view.image_url, seed.image_url);
        assert!(view.choices.is_empty());
        assert!(!view.started);
        assert_eq!(view.progress(), 0.0);
    }

    #[test]
    fn view_tracks_generation_and_beats() {
        let mut session = GameSession::new(StorySeed::default());
        session.start_turn(PlayerAction::Begin).unwrap();
        assert!(session.view().generating);

        session
            .finish_turn(Ok(Message::assistant(
                "Plot: Dust everywhere.\n1. Dig\n2. Wait\n3. Leave",
            )))
            .unwrap();
        let view = session.view();

        assert!(!view.generating);
        assert!(view.started);
        assert_eq!(view.plot, "Dust everywhere.");
        assert_eq!(view.choices.len(), 3);
        assert_eq!(view.history.len(), 1);
    }
}
