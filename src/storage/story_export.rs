use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::engine::session::GameSession;
use crate::model::message::Message;
use crate::model::story_node::StoryNode;

/// What a player gets when saving their story to disk.
#[derive(Serialize)]
struct StoryExport<'a> {
    title: &'a str,
    choices_made: u32,
    max_choices: u32,
    finished: bool,
    beats: &'a [StoryNode],
    transcript: &'a [Message],
}

pub fn export_story(path: &Path, session: &GameSession) -> Result<()> {
    let export = StoryExport {
        title: &session.seed().title,
        choices_made: session.choice_count(),
        max_choices: session.max_choices(),
        finished: session.current().is_some_and(|n| n.is_ending),
        beats: session.history(),
        transcript: session.transcript().messages(),
    };

    let json = serde_json::to_string_pretty(&export)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::session::PlayerAction;
    use crate::model::story_seed::StorySeed;

    #[test]
    fn writes_beats_and_transcript() {
        let mut session = GameSession::new(StorySeed::default());
        session.start_turn(PlayerAction::Begin).unwrap();
        session
            .finish_turn(Ok(Message::assistant("Plot: Stars.\n1. Fly\n2. Land")))
            .unwrap();

        let mut path = std::env::temp_dir();
        path.push(format!("pathfinder-export-{}.json", std::process::id()));
        export_story(&path, &session).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["title"], "On Galaxy's Edge");
        assert_eq!(written["beats"][0]["plot"], "Stars.");
        assert_eq!(written["transcript"].as_array().unwrap().len(), 3);
        assert_eq!(written["transcript"][2]["role"], "assistant");
        assert_eq!(written["finished"], false);

        let _ = fs::remove_file(&path);
    }
}
