use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::ui::app::PathfinderApp;
use crate::ui::settings::{MAX_UI_SCALE, MIN_UI_SCALE};
use crate::ui::settings_io::save_settings;

pub fn draw_left_panel(ctx: &egui::Context, app: &mut PathfinderApp) {
    egui::SidePanel::left("settings")
        .resizable(false)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Settings");
            if let Some(name) = &app.ui.username {
                ui.label(format!("Signed in as {name}"));
            }
            ui.separator();

            ui.label("UI Scale");
            let scale = ui.add(egui::Slider::new(
                &mut app.ui.settings.ui_scale,
                MIN_UI_SCALE..=MAX_UI_SCALE,
            ));
            let log = ui.checkbox(&mut app.ui.settings.show_story_log, "Show story log");
            if scale.drag_stopped() || log.changed() {
                save_settings(&app.ui.settings);
            }

            ui.separator();

            let idle = !app.ui.generating;

            if ui
                .add_enabled(idle && app.ui.story.started, egui::Button::new("Restart story"))
                .clicked()
            {
                app.send_command(EngineCommand::Restart);
            }

            if ui
                .add_enabled(idle && !app.ui.story.history.is_empty(), egui::Button::new("Export story…"))
                .clicked()
            {
                if let Some(path) = rfd::FileDialog::new()
                    .set_file_name("story.json")
                    .add_filter("JSON", &["json"])
                    .save_file()
                {
                    app.export_story(path);
                }
            }

            ui.separator();

            if ui.add_enabled(idle, egui::Button::new("Delete Profile")).clicked() {
                app.send_command(EngineCommand::DeleteProfile);
            }

            if let Some(status) = &app.ui.status {
                ui.separator();
                ui.small(status);
            }
        });
}
