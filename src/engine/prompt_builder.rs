use crate::model::message::Message;
use crate::model::story_seed::StorySeed;

/// Appended to the final choice so the model writes an ending.
pub const END_DIRECTIVE: &str = "Create a conclusion to the story. Label it as [Conclusion].";

/// Builds the messages the engine adds to a transcript.
/// Only formats text: no parsing, no networking.
pub struct PromptBuilder;

impl PromptBuilder {
    /// The system message every session transcript starts with.
    pub fn system(seed: &StorySeed) -> Message {
        let mut prompt = String::new();

        prompt.push_str("We are playing an adventure game. ");
        prompt.push_str(&format!("The plot of the story is: {}\n\n", seed.plot.trim()));

        prompt.push_str("FORMAT:\n");
        prompt.push_str("- Start every reply with one line labelled \"Plot:\" describing what happens next.\n");
        prompt.push_str("- Then write \"Choices:\" on its own line.\n");
        prompt.push_str("- Then give exactly 3 choices to progress through the story, numbered \"1.\", \"2.\" and \"3.\", one per line.\n");
        prompt.push_str("- The player answers with the text of one choice.\n");
        prompt.push_str("- When asked for a conclusion, write the ending of the story and label it as [Conclusion]. Give no choices after it.\n");

        Message::system(prompt)
    }

    /// The synthetic opening turn carrying the story seed.
    pub fn begin(seed: &StorySeed) -> Message {
        Message::user(seed.plot.trim())
    }

    pub fn choice(choice: &str) -> Message {
        Message::user(choice)
    }

    /// The last choice of a session, with the request for a conclusion.
    pub fn final_choice(choice: &str) -> Message {
        Message::user(format!("{choice}\n{END_DIRECTIVE}"))
    }

    /// Cheapest possible conversation, used to check an API key works.
    pub fn probe() -> Vec<Message> {
        vec![Message::system("You are a nice robot."), Message::user("Hello.")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::message::Role;

    #[test]
    fn system_prompt_carries_plot_and_labels() {
        let seed = StorySeed::default();
        let msg = PromptBuilder::system(&seed);

        assert_eq!(msg.role, Role::System);
        assert!(msg.content.contains(&seed.plot));
        assert!(msg.content.contains("Plot:"));
        assert!(msg.content.contains("[Conclusion]"));
    }

    #[test]
    fn final_choice_keeps_choice_and_asks_for_ending() {
        let msg = PromptBuilder::final_choice("3. Signal");
        assert_eq!(msg.role, Role::User);
        assert!(msg.content.starts_with("3. Signal"));
        assert!(msg.content.ends_with(END_DIRECTIVE));
    }
}
