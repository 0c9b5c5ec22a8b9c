use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::story_node::choice_label;
use crate::ui::app::{PathfinderApp, Screen};

const IMAGE_MAX_HEIGHT: f32 = 320.0;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut PathfinderApp) {
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| match app.ui.screen {
            Screen::Cover => draw_cover(ui, app),
            _ => draw_gameplay(ui, app),
        });
    });
}

fn draw_image(ui: &mut egui::Ui, app: &mut PathfinderApp, url: Option<&str>) {
    let Some(url) = url else {
        return;
    };

    match app.image(url) {
        Some(texture) => {
            ui.add(
                egui::Image::new(&texture)
                    .max_width(ui.available_width())
                    .max_height(IMAGE_MAX_HEIGHT),
            );
        }
        None => {
            ui.add_space(8.0);
        }
    }
}

/* =========================
   Cover
   ========================= */

fn draw_cover(ui: &mut egui::Ui, app: &mut PathfinderApp) {
    let story = app.ui.story.clone();

    ui.label(egui::RichText::new("Playing...").strong());
    ui.add_space(8.0);

    draw_image(ui, app, story.image_url.as_deref());

    ui.heading(egui::RichText::new(&story.title).size(32.0).strong());
    ui.label(&story.plot);
    ui.add_space(16.0);

    if ui.button("Start Adventure").clicked() {
        app.ui.screen = Screen::Playing;
    }
}

/* =========================
   Gameplay
   ========================= */

fn draw_gameplay(ui: &mut egui::Ui, app: &mut PathfinderApp) {
    let story = app.ui.story.clone();
    let generating = app.ui.generating;

    // Progress
    ui.add(
        egui::ProgressBar::new(story.progress())
            .show_percentage()
            .desired_width(ui.available_width()),
    );
    ui.add_space(8.0);

    ui.heading(egui::RichText::new(&story.title).size(36.0).strong());
    ui.add_space(8.0);

    draw_image(ui, app, story.image_url.as_deref());
    ui.add_space(8.0);

    match (&story.ending_text, story.is_ending) {
        (Some(end), true) => {
            if !story.plot.is_empty() && story.plot != *end {
                ui.label(&story.plot);
                ui.add_space(4.0);
            }
            ui.label(egui::RichText::new(format!("Conclusion: {end}")).italics());
        }
        _ => {
            ui.label(&story.plot);
        }
    }
    ui.add_space(12.0);

    if generating {
        ui.horizontal(|ui| {
            ui.add(egui::Spinner::new());
            ui.strong("Generating...");
        });
        return;
    }

    if let Some(err) = &story.error {
        ui.colored_label(egui::Color32::LIGHT_RED, err);
        if story.can_retry && ui.button("Try again").clicked() {
            app.send_command(EngineCommand::Retry);
            return;
        }
        ui.add_space(8.0);
    }

    if !story.started {
        if ui.button("Begin Your Journey").clicked() {
            app.send_command(EngineCommand::Begin);
        }
        return;
    }

    if story.is_ending {
        ui.strong("The End");
        if ui.button("Play again").clicked() {
            app.send_command(EngineCommand::Restart);
        }
        return;
    }

    let mut picked = None;
    for (index, choice) in story.choices.iter().enumerate() {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            let text = format!("{}. {}", index + 1, choice_label(choice));
            if ui.add(egui::Button::new(text).wrap().frame(false)).clicked() {
                picked = Some(index);
            }
        });
        ui.add_space(6.0);
    }

    if let Some(index) = picked {
        app.send_command(EngineCommand::Choose(index));
    }
}
