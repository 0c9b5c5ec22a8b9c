use eframe::egui;

use crate::model::story_node::choice_label;
use crate::model::story_view::StoryView;

/// Every beat so far, oldest first.
pub fn draw_right_panel(ctx: &egui::Context, story: &StoryView) {
    egui::SidePanel::right("story_log")
        .resizable(true)
        .default_width(300.0)
        .min_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Story so far");
            ui.separator();

            if story.history.is_empty() {
                ui.label("Nothing yet.");
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, node) in story.history.iter().enumerate() {
                    let title = if node.is_ending {
                        "Conclusion".to_string()
                    } else {
                        format!("Chapter {}", i + 1)
                    };

                    egui::CollapsingHeader::new(title)
                        .id_salt(i)
                        .default_open(i + 1 == story.history.len())
                        .show(ui, |ui| {
                            ui.label(node.body());
                            for choice in &node.choices {
                                ui.label(format!("• {}", choice_label(choice)));
                            }
                        });
                }
            });
        });
}
