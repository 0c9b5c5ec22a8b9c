use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use eframe::egui;
use log::warn;

use crate::engine::engine::Engine;
use crate::engine::image_loader::{run_image_worker, DecodedImage};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::config::AppConfig;
use crate::model::story_view::StoryView;
use crate::storage::profile_store::ProfileStore;
use crate::ui::center_panel::draw_center_panel;
use crate::ui::left_panel::draw_left_panel;
use crate::ui::right_panel::draw_right_panel;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::load_settings;
use crate::ui::setup::draw_setup;

/// How often to poll the engine while waiting on it.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/* =========================
   Screens
   ========================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Waiting for the engine to report the stored profile.
    #[default]
    Loading,
    Setup,
    /// Title card shown before play starts.
    Cover,
    Playing,
}

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub screen: Screen,
    pub username: Option<String>,

    pub setup_username: String,
    pub setup_api_key: String,
    pub setup_error: Option<String>,
    pub verifying: bool,

    pub story: StoryView,
    /// Set as soon as a story command is sent, cleared by the next view.
    pub generating: bool,

    pub status: Option<String>,
    pub settings: UiSettings,
}

impl UiState {
    pub fn waiting_on_engine(&self) -> bool {
        self.generating || self.verifying || self.screen == Screen::Loading
    }
}

/* =========================
   Images
   ========================= */

pub enum ImageSlot {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

/* =========================
   App
   ========================= */

pub struct PathfinderApp {
    pub ui: UiState,
    images: HashMap<String, ImageSlot>,

    cmd_tx: mpsc::Sender<EngineCommand>,
    image_tx: mpsc::Sender<String>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl PathfinderApp {
    pub fn new(config: AppConfig, store: Box<dyn ProfileStore + Send>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let (image_tx, image_rx) = mpsc::channel();

        let image_resp_tx = resp_tx.clone();
        let image_timeout = Duration::from_secs(config.endpoint.timeout_secs);
        std::thread::spawn(move || run_image_worker(image_rx, image_resp_tx, image_timeout));

        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, config, store);
            engine.run();
        });

        Self {
            ui: UiState {
                settings: load_settings(),
                ..Default::default()
            },
            images: HashMap::new(),
            cmd_tx,
            image_tx,
            resp_rx,
        }
    }

    pub fn send_command(&mut self, cmd: EngineCommand) {
        if matches!(
            cmd,
            EngineCommand::Begin | EngineCommand::Choose(_) | EngineCommand::Retry
        ) {
            self.ui.generating = true;
        }

        if self.cmd_tx.send(cmd).is_err() {
            warn!("engine thread is gone");
            self.ui.generating = false;
            self.ui.status = Some("The story engine stopped unexpectedly.".into());
        }
    }

    pub fn export_story(&mut self, path: PathBuf) {
        self.send_command(EngineCommand::ExportStory(path));
    }

    /// Texture for `url`, starting a download the first time it is asked for.
    pub fn image(&mut self, url: &str) -> Option<egui::TextureHandle> {
        match self.images.get(url) {
            Some(ImageSlot::Ready(tex)) => Some(tex.clone()),
            Some(_) => None,
            None => {
                let slot = if self.image_tx.send(url.to_string()).is_ok() {
                    ImageSlot::Loading
                } else {
                    warn!("image worker is gone");
                    ImageSlot::Failed
                };
                self.images.insert(url.to_string(), slot);
                None
            }
        }
    }

    fn handle_response(&mut self, ctx: &egui::Context, resp: EngineResponse) {
        match resp {
            EngineResponse::ProfileLoaded(username) => {
                self.ui.screen = if username.is_some() {
                    Screen::Cover
                } else {
                    Screen::Setup
                };
                self.ui.username = username;
            }

            EngineResponse::ProfileSaved(username) => {
                self.ui.username = Some(username);
                self.ui.verifying = false;
                self.ui.setup_api_key.clear();
                self.ui.setup_error = None;
                self.ui.screen = Screen::Cover;
            }

            EngineResponse::ProfileRejected(reason) => {
                self.ui.verifying = false;
                self.ui.setup_error = Some(reason);
            }

            EngineResponse::ProfileCleared => {
                self.ui.username = None;
                self.ui.setup_username.clear();
                self.ui.screen = Screen::Setup;
            }

            EngineResponse::Story(view) => {
                self.ui.generating = view.generating;
                self.ui.story = view;
            }

            EngineResponse::Exported(path) => {
                self.ui.status = Some(format!("Story saved to {}", path.display()));
            }

            EngineResponse::ExportFailed(reason) => {
                self.ui.status = Some(format!("Could not save the story: {reason}"));
            }

            EngineResponse::Image { url, image } => {
                let texture = load_texture(ctx, &url, image);
                self.images.insert(url, ImageSlot::Ready(texture));
            }

            EngineResponse::ImageFailed { url, .. } => {
                self.images.insert(url, ImageSlot::Failed);
            }
        }
    }
}

fn load_texture(ctx: &egui::Context, url: &str, image: DecodedImage) -> egui::TextureHandle {
    let color = egui::ColorImage::from_rgba_unmultiplied(image.size, &image.rgba);
    ctx.load_texture(url, color, egui::TextureOptions::LINEAR)
}

/* =========================
   egui App
   ========================= */

impl eframe::App for PathfinderApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.ui.settings.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.handle_response(ctx, resp);
        }

        match self.ui.screen {
            Screen::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Spinner::new());
                    });
                });
            }

            Screen::Setup => draw_setup(ctx, self),

            Screen::Cover | Screen::Playing => {
                draw_left_panel(ctx, self);
                if self.ui.settings.show_story_log {
                    draw_right_panel(ctx, &self.ui.story);
                }
                draw_center_panel(ctx, self);
            }
        }

        if self.ui.waiting_on_engine() || self.images.values().any(|s| matches!(s, ImageSlot::Loading)) {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}
