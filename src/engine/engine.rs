use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};

use log::{error, info, warn};

use crate::engine::llm_client::{ChatClient, GenerationError, Generator};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::session::{GameSession, PlayerAction};
use crate::model::config::AppConfig;
use crate::model::profile::Profile;
use crate::storage::profile_store::ProfileStore;
use crate::storage::story_export::export_story;

type BoxedGenerator = Box<dyn Generator + Send>;
type Connector = Box<dyn Fn(&Profile) -> Result<BoxedGenerator, GenerationError> + Send>;

/// Owns the session and does all blocking work off the UI thread.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    config: AppConfig,
    store: Box<dyn ProfileStore + Send>,
    connect: Connector,
    generator: Option<BoxedGenerator>,
    session: GameSession,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        config: AppConfig,
        store: Box<dyn ProfileStore + Send>,
    ) -> Self {
        let endpoint = config.endpoint.clone();
        let connect: Connector = Box::new(move |profile: &Profile| -> Result<BoxedGenerator, GenerationError> {
            let client = ChatClient::new(endpoint.clone(), Some(profile.api_key.clone()))?;
            Ok(Box::new(client) as BoxedGenerator)
        });

        Self::with_connector(rx, tx, config, store, connect)
    }

    pub fn with_connector(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        config: AppConfig,
        store: Box<dyn ProfileStore + Send>,
        connect: Connector,
    ) -> Self {
        let session = GameSession::new(config.story.clone());
        Self {
            rx,
            tx,
            config,
            store,
            connect,
            generator: None,
            session,
        }
    }

    pub fn run(&mut self) {
        self.load_profile();

        while let Ok(cmd) = self.rx.recv() {
            self.handle(cmd);
        }

        info!("UI went away, engine stopping");
    }

    fn handle(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::SubmitProfile { username, api_key } => {
                self.submit_profile(&username, &api_key);
            }

            EngineCommand::DeleteProfile => {
                if let Err(e) = self.store.delete() {
                    warn!("could not delete profile: {e}");
                }
                self.generator = None;
                self.session = GameSession::new(self.config.story.clone());
                self.send(EngineResponse::ProfileCleared);
                self.send_story();
            }

            EngineCommand::Begin => self.advance(PlayerAction::Begin),
            EngineCommand::Choose(index) => self.advance(PlayerAction::Choose(index)),

            EngineCommand::Retry => match self.session.retry_action() {
                Ok(action) => {
                    info!("retrying {action:?}");
                    self.advance(action);
                }
                Err(e) => {
                    warn!("ignored retry: {e}");
                    self.session.report_error(e.to_string());
                    self.send_story();
                }
            },

            EngineCommand::Restart => {
                info!("restarting story");
                self.session = GameSession::new(self.config.story.clone());
                self.send_story();
            }

            EngineCommand::ExportStory(path) => self.export(&path),
        }
    }

    fn load_profile(&mut self) {
        let username = match self.store.load() {
            Ok(Some(profile)) => match (self.connect)(&profile) {
                Ok(generator) => {
                    info!("loaded profile for {}", profile.username);
                    self.generator = Some(generator);
                    Some(profile.username)
                }
                Err(e) => {
                    warn!("stored profile is unusable: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("could not read stored profile: {e}");
                None
            }
        };

        self.send(EngineResponse::ProfileLoaded(username));
        self.send_story();
    }

    fn submit_profile(&mut self, username: &str, api_key: &str) {
        let profile = match Profile::new(username, api_key) {
            Ok(profile) => profile,
            Err(reason) => return self.send(EngineResponse::ProfileRejected(reason)),
        };

        let generator = match (self.connect)(&profile).and_then(|g| g.verify().map(|_| g)) {
            Ok(generator) => generator,
            Err(e) => {
                warn!("API key check failed: {e}");
                return self.send(EngineResponse::ProfileRejected(format!(
                    "Could not verify the API key: {e}"
                )));
            }
        };

        if let Err(e) = self.store.save(&profile) {
            error!("could not save profile: {e}");
            return self.send(EngineResponse::ProfileRejected(format!(
                "Could not save the profile: {e}"
            )));
        }

        self.generator = Some(generator);
        self.send(EngineResponse::ProfileSaved(profile.username));
        self.send_story();
    }

    /// One full turn: announce the pending request, generate, report.
    fn advance(&mut self, action: PlayerAction) {
        let Some(generator) = self.generator.as_deref() else {
            self.session.report_error("Set up a profile before playing.");
            return self.send_story();
        };

        match self.session.start_turn(action) {
            Ok(request) => {
                self.send_story();
                let result = generator.complete(&request);
                if let Err(e) = self.session.finish_turn(result) {
                    error!("turn bookkeeping failed: {e}");
                }
            }
            Err(e) => {
                warn!("ignored {action:?}: {e}");
                self.session.report_error(e.to_string());
            }
        }

        self.send_story();
    }

    fn export(&self, path: &Path) {
        match export_story(path, &self.session) {
            Ok(()) => {
                info!("exported story to {}", path.display());
                self.send(EngineResponse::Exported(path.to_path_buf()));
            }
            Err(e) => {
                warn!("export failed: {e:#}");
                self.send(EngineResponse::ExportFailed(format!("{e:#}")));
            }
        }
    }

    fn send_story(&self) {
        self.send(EngineResponse::Story(self.session.view()));
    }

    fn send(&self, resp: EngineResponse) {
        let _ = self.tx.send(resp);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::message::Message;
    use crate::model::story_view::StoryView;
    use crate::storage::profile_store::MemoryProfileStore;

    const BEAT: &str = "Plot: You land on a moon.\nChoices:\n1. Explore\n2. Hide\n3. Signal";

    type Replies = Arc<Mutex<VecDeque<Result<Message, GenerationError>>>>;

    struct Scripted {
        replies: Replies,
        key_ok: bool,
    }

    impl Generator for Scripted {
        fn complete(&self, _: &[Message]) -> Result<Message, GenerationError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Network("script exhausted".into())))
        }

        fn verify(&self) -> Result<(), GenerationError> {
            if self.key_ok {
                Ok(())
            } else {
                Err(GenerationError::Api {
                    status: 401,
                    message: "Incorrect API key provided".into(),
                })
            }
        }
    }

    struct Harness {
        engine: Engine,
        rx: mpsc::Receiver<EngineResponse>,
        replies: Replies,
    }

    impl Harness {
        fn new(stored: Option<Profile>) -> Self {
            let (_cmd_tx, cmd_rx) = mpsc::channel();
            let (resp_tx, resp_rx) = mpsc::channel();
            let replies: Replies = Arc::default();

            let for_connect = replies.clone();
            let connect: Connector = Box::new(move |profile: &Profile| -> Result<BoxedGenerator, GenerationError> {
                Ok(Box::new(Scripted {
                    replies: for_connect.clone(),
                    key_ok: profile.api_key == "sk-good",
                }) as BoxedGenerator)
            });

            let store = MemoryProfileStore { profile: stored };
            let engine = Engine::with_connector(
                cmd_rx,
                resp_tx,
                AppConfig::default(),
                Box::new(store),
                connect,
            );

            Self {
                engine,
                rx: resp_rx,
                replies,
            }
        }

        fn script(&self, reply: Result<&str, GenerationError>) {
            self.replies
                .lock()
                .unwrap()
                .push_back(reply.map(Message::assistant));
        }

        fn drain(&self) -> Vec<EngineResponse> {
            self.rx.try_iter().collect()
        }

        fn stories(&self) -> Vec<StoryView> {
            self.drain()
                .into_iter()
                .filter_map(|r| match r {
                    EngineResponse::Story(view) => Some(view),
                    _ => None,
                })
                .collect()
        }
    }

    fn good_profile() -> Profile {
        Profile::new("nova", "sk-good").unwrap()
    }

    #[test]
    fn startup_reports_stored_profile() {
        let mut h = Harness::new(Some(good_profile()));
        h.engine.load_profile();

        let responses = h.drain();
        assert!(matches!(
            responses.first(),
            Some(EngineResponse::ProfileLoaded(Some(name))) if name == "nova"
        ));
    }

    #[test]
    fn playing_without_profile_reports_error() {
        let mut h = Harness::new(None);
        h.engine.handle(EngineCommand::Begin);

        let views = h.stories();
        assert_eq!(views.len(), 1);
        assert!(views[0].error.is_some());
        assert!(!views[0].started);
    }

    #[test]
    fn bad_key_is_rejected_and_not_saved() {
        let mut h = Harness::new(None);
        h.engine.handle(EngineCommand::SubmitProfile {
            username: "nova".into(),
            api_key: "sk-bad".into(),
        });

        assert!(matches!(
            h.drain().first(),
            Some(EngineResponse::ProfileRejected(reason)) if reason.contains("Incorrect API key")
        ));
        assert!(h.engine.store.load().unwrap().is_none());
        assert!(h.engine.generator.is_none());
    }

    #[test]
    fn short_username_is_rejected() {
        let mut h = Harness::new(None);
        h.engine.handle(EngineCommand::SubmitProfile {
            username: "no".into(),
            api_key: "sk-good".into(),
        });

        assert!(matches!(
            h.drain().first(),
            Some(EngineResponse::ProfileRejected(_))
        ));
    }

    #[test]
    fn good_key_is_saved_and_story_can_begin() {
        let mut h = Harness::new(None);
        h.engine.handle(EngineCommand::SubmitProfile {
            username: "nova".into(),
            api_key: "sk-good".into(),
        });
        assert!(matches!(
            h.drain().first(),
            Some(EngineResponse::ProfileSaved(name)) if name == "nova"
        ));
        assert_eq!(h.engine.store.load().unwrap(), Some(good_profile()));

        h.script(Ok(BEAT));
        h.engine.handle(EngineCommand::Begin);

        let views = h.stories();
        assert_eq!(views.len(), 2);
        assert!(views[0].generating);
        assert!(!views[1].generating);
        assert_eq!(views[1].plot, "You land on a moon.");
        assert_eq!(views[1].choices.len(), 3);
    }

    #[test]
    fn failure_then_retry() {
        let mut h = Harness::new(Some(good_profile()));
        h.engine.load_profile();
        h.drain();

        h.script(Ok(BEAT));
        h.engine.handle(EngineCommand::Begin);
        h.drain();

        h.script(Err(GenerationError::Timeout { secs: 60 }));
        h.engine.handle(EngineCommand::Choose(1));
        let failed = h.stories().pop().unwrap();
        assert!(failed.can_retry);
        assert_eq!(failed.choice_count, 0);
        assert!(failed.error.unwrap().contains("timed out"));

        h.script(Ok(BEAT));
        h.engine.handle(EngineCommand::Retry);
        let recovered = h.stories().pop().unwrap();
        assert_eq!(recovered.choice_count, 1);
        assert!(recovered.error.is_none());
        assert!(!recovered.can_retry);
    }

    #[test]
    fn retry_with_nothing_failed_only_reports() {
        let mut h = Harness::new(Some(good_profile()));
        h.engine.load_profile();
        h.script(Ok(BEAT));
        h.engine.handle(EngineCommand::Begin);
        h.drain();

        h.engine.handle(EngineCommand::Retry);
        let view = h.stories().pop().unwrap();
        assert!(view.error.unwrap().contains("nothing to retry"));
        assert_eq!(h.engine.session.transcript().len(), 3);
    }

    #[test]
    fn delete_profile_resets_everything() {
        let mut h = Harness::new(Some(good_profile()));
        h.engine.load_profile();
        h.script(Ok(BEAT));
        h.engine.handle(EngineCommand::Begin);
        h.drain();

        h.engine.handle(EngineCommand::DeleteProfile);

        let responses = h.drain();
        assert!(matches!(responses.first(), Some(EngineResponse::ProfileCleared)));
        assert!(h.engine.store.load().unwrap().is_none());
        assert!(h.engine.generator.is_none());
        assert!(!h.engine.session.view().started);
    }
}
