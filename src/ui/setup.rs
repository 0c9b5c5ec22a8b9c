use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::profile::MIN_USERNAME_LEN;
use crate::ui::app::PathfinderApp;

pub fn draw_setup(ctx: &egui::Context, app: &mut PathfinderApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading(egui::RichText::new("Setup").size(36.0).strong());
            ui.add_space(12.0);

            ui.label(
                "In order to use this app, you must provide your own OpenAI API key. \
                 Your data will be saved locally on your own device but you can remove \
                 this data in Settings later.",
            );
            ui.add_space(16.0);

            ui.add(
                egui::TextEdit::singleline(&mut app.ui.setup_username)
                    .hint_text("Enter a username"),
            );
            ui.add(
                egui::TextEdit::singleline(&mut app.ui.setup_api_key)
                    .password(true)
                    .hint_text("OpenAI API Key"),
            );

            let ready = app.ui.setup_username.trim().chars().count() >= MIN_USERNAME_LEN
                && !app.ui.setup_api_key.trim().is_empty()
                && !app.ui.verifying;

            ui.add_space(8.0);
            if ui.add_enabled(ready, egui::Button::new("Submit")).clicked() {
                app.ui.verifying = true;
                app.ui.setup_error = None;
                let cmd = EngineCommand::SubmitProfile {
                    username: app.ui.setup_username.clone(),
                    api_key: app.ui.setup_api_key.clone(),
                };
                app.send_command(cmd);
            }

            if app.ui.verifying {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label("Checking your key…");
                });
            }

            if let Some(err) = &app.ui.setup_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err);
            }
        });
    });
}
