use serde::{Deserialize, Serialize};

/// One rendered beat of the narrative, parsed from a single assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    pub plot: String,
    pub choices: Vec<String>,
    pub image_url: Option<String>,
    pub is_ending: bool,
    pub ending_text: Option<String>,
}

impl StoryNode {
    pub fn beat(plot: String, choices: Vec<String>, image_url: Option<String>) -> Self {
        Self {
            plot,
            choices,
            image_url,
            is_ending: false,
            ending_text: None,
        }
    }

    pub fn ending(plot: String, ending_text: String, image_url: Option<String>) -> Self {
        Self {
            plot,
            choices: Vec::new(),
            image_url,
            is_ending: true,
            ending_text: Some(ending_text),
        }
    }

    /// Text shown as the body of this beat.
    pub fn body(&self) -> &str {
        match &self.ending_text {
            Some(end) if self.is_ending => end,
            _ => &self.plot,
        }
    }
}

/// Strip the leading "1." / "2)" / "Choice 3:" marker from a choice line.
///
/// The full line is what gets sent back to the model; this is only for
/// rendering next to an ordinal.
pub fn choice_label(choice: &str) -> &str {
    let mut rest = choice.trim().trim_start_matches('*');

    if rest
        .get(..6)
        .is_some_and(|p| p.eq_ignore_ascii_case("choice"))
    {
        rest = rest[6..].trim_start();
    }

    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest
        .trim_start_matches(|c: char| matches!(c, '.' | ':' | ')' | '-' | '*'))
        .trim();

    if rest.is_empty() {
        choice.trim()
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_drop_ordinal_markers() {
        assert_eq!(choice_label("1. Explore"), "Explore");
        assert_eq!(choice_label("2) Hide"), "Hide");
        assert_eq!(choice_label("Choice 3: Signal the fleet"), "Signal the fleet");
        assert_eq!(choice_label("**1.** Run"), "Run");
    }

    #[test]
    fn label_falls_back_to_whole_line() {
        assert_eq!(choice_label("3."), "3.");
        assert_eq!(choice_label("Wait quietly"), "Wait quietly");
    }

    #[test]
    fn body_prefers_ending_text() {
        let node = StoryNode::ending("You drift.".into(), "Home at last.".into(), None);
        assert_eq!(node.body(), "Home at last.");
        assert!(node.choices.is_empty());

        let beat = StoryNode::beat("You drift.".into(), vec!["1. Wake".into()], None);
        assert_eq!(beat.body(), "You drift.");
    }
}
