use log::{debug, info, warn};
use thiserror::Error;

use crate::engine::llm_client::{GenerationError, Generator};
use crate::engine::narrative_parser::{parse_story_node, ParseError};
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::message::Message;
use crate::model::story_node::StoryNode;
use crate::model::story_seed::StorySeed;
use crate::model::story_view::StoryView;
use crate::model::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    AwaitingResponse,
    AwaitingChoice,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Begin,
    /// Index into the current node's choices.
    Choose(usize),
}

/// What happened to one generation round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Advanced(StoryNode),
    Ended(StoryNode),
    /// The request failed; nothing was committed.
    TransportFailed(GenerationError),
    /// The model answered but not in a shape we can render; nothing was committed.
    Unparseable { raw: String, error: ParseError },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a story beat is already being generated")]
    Busy,
    #[error("the story has ended")]
    Ended,
    #[error("the story has already begun")]
    AlreadyStarted,
    #[error("the story has not begun yet")]
    NotStarted,
    #[error("there is no choice {index} (only {available} available)")]
    InvalidChoice { index: usize, available: usize },
    #[error("no generation is in flight")]
    NoPendingTurn,
    #[error("there is nothing to retry")]
    NothingToRetry,
}

/// A turn whose effects are held back until the reply parses.
#[derive(Debug, Clone)]
struct PendingTurn {
    action: PlayerAction,
    message: Message,
    choice_count: u32,
    expects_ending: bool,
    resume: Phase,
}

/// One playthrough: transcript, current beat and progress.
#[derive(Debug, Clone)]
pub struct GameSession {
    seed: StorySeed,
    transcript: Transcript,
    current: Option<StoryNode>,
    history: Vec<StoryNode>,
    choice_count: u32,
    max_choices: u32,
    phase: Phase,
    pending: Option<PendingTurn>,
    failed_action: Option<PlayerAction>,
    last_error: Option<String>,
}

impl GameSession {
    pub fn new(seed: StorySeed) -> Self {
        let mut transcript = Transcript::new();
        transcript.push(PromptBuilder::system(&seed));

        Self {
            max_choices: seed.max_choices,
            seed,
            transcript,
            current: None,
            history: Vec::new(),
            choice_count: 0,
            phase: Phase::NotStarted,
            pending: None,
            failed_action: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generating(&self) -> bool {
        self.phase == Phase::AwaitingResponse
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn current(&self) -> Option<&StoryNode> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[StoryNode] {
        &self.history
    }

    pub fn choice_count(&self) -> u32 {
        self.choice_count
    }

    pub fn max_choices(&self) -> u32 {
        self.max_choices
    }

    pub fn seed(&self) -> &StorySeed {
        &self.seed
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The action whose last attempt failed, if any.
    pub fn failed_action(&self) -> Option<PlayerAction> {
        self.failed_action
    }

    pub fn can_retry(&self) -> bool {
        self.failed_action.is_some() && self.phase != Phase::AwaitingResponse
    }

    /// Stage `action` and return the transcript to send.
    ///
    /// Moves to `AwaitingResponse`; nothing is committed until
    /// [`finish_turn`](Self::finish_turn) sees a reply that parses.
    pub fn start_turn(&mut self, action: PlayerAction) -> Result<Vec<Message>, SessionError> {
        let (message, choice_count) = match (self.phase, action) {
            (Phase::AwaitingResponse, _) => return Err(SessionError::Busy),
            (Phase::Ended, _) => return Err(SessionError::Ended),

            (Phase::NotStarted, PlayerAction::Begin) => {
                (PromptBuilder::begin(&self.seed), self.choice_count)
            }
            (Phase::NotStarted, PlayerAction::Choose(_)) => return Err(SessionError::NotStarted),
            (Phase::AwaitingChoice, PlayerAction::Begin) => {
                return Err(SessionError::AlreadyStarted)
            }

            (Phase::AwaitingChoice, PlayerAction::Choose(index)) => {
                let choices = self
                    .current
                    .as_ref()
                    .map(|n| n.choices.as_slice())
                    .unwrap_or_default();
                let choice = choices.get(index).ok_or(SessionError::InvalidChoice {
                    index,
                    available: choices.len(),
                })?;

                let count = self.choice_count + 1;
                let message = if count >= self.max_choices {
                    PromptBuilder::final_choice(choice)
                } else {
                    PromptBuilder::choice(choice)
                };
                (message, count)
            }
        };

        let request = self.transcript.with_pending(&message);
        info!(
            "starting turn {:?} (choice {}/{})",
            action, choice_count, self.max_choices
        );

        self.pending = Some(PendingTurn {
            action,
            message,
            choice_count,
            expects_ending: choice_count >= self.max_choices,
            resume: self.phase,
        });
        self.phase = Phase::AwaitingResponse;

        Ok(request)
    }

    /// Resolve the in-flight turn with the generation result.
    pub fn finish_turn(
        &mut self,
        result: Result<Message, GenerationError>,
    ) -> Result<TurnOutcome, SessionError> {
        let pending = self.pending.take().ok_or(SessionError::NoPendingTurn)?;

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!("generation failed: {err}");
                self.revert(&pending, err.to_string());
                return Ok(TurnOutcome::TransportFailed(err));
            }
        };

        debug!("model reply:\n{}", reply.content);

        let node = match parse_story_node(&reply.content, pending.expects_ending) {
            Ok(node) => node,
            Err(error) => {
                warn!("could not parse model reply: {error}");
                self.revert(&pending, format!("The story could not be read: {error}"));
                return Ok(TurnOutcome::Unparseable {
                    raw: reply.content,
                    error,
                });
            }
        };

        self.transcript.push(pending.message);
        self.transcript.push(reply);
        self.choice_count = pending.choice_count;
        self.failed_action = None;
        self.last_error = None;
        self.history.push(node.clone());
        self.current = Some(node.clone());

        if node.is_ending {
            info!("story ended after {} choices", self.choice_count);
            self.phase = Phase::Ended;
            Ok(TurnOutcome::Ended(node))
        } else {
            self.phase = Phase::AwaitingChoice;
            Ok(TurnOutcome::Advanced(node))
        }
    }

    /// Run one full round trip against `generator`.
    ///
    /// Blocks for the whole call. The engine thread uses `start_turn` and
    /// `finish_turn` instead so it can publish the in-flight view.
    pub fn play(
        &mut self,
        action: PlayerAction,
        generator: &dyn Generator,
    ) -> Result<TurnOutcome, SessionError> {
        let request = self.start_turn(action)?;
        let result = generator.complete(&request);
        self.finish_turn(result)
    }

    /// The action a retry would re-issue.
    pub fn retry_action(&self) -> Result<PlayerAction, SessionError> {
        if self.phase == Phase::AwaitingResponse {
            return Err(SessionError::Busy);
        }
        self.failed_action.ok_or(SessionError::NothingToRetry)
    }

    /// Re-issue the action whose generation last failed, blocking like [`play`](Self::play).
    pub fn retry(&mut self, generator: &dyn Generator) -> Result<TurnOutcome, SessionError> {
        let action = self.retry_action()?;
        info!("retrying {action:?}");
        self.play(action, generator)
    }

    /// Record a problem that happened outside a turn, e.g. no profile.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn view(&self) -> StoryView {
        StoryView::from(self)
    }

    fn revert(&mut self, pending: &PendingTurn, error: String) {
        self.phase = pending.resume;
        self.failed_action = Some(pending.action);
        self.last_error = Some(error);
    }
}
