use egui::{Color32, TextEdit};

use super::{RoomStudioApp, SceneState, Workflow};
use crate::acquire;

impl RoomStudioApp {
    pub(super) fn menu_ui(&mut self, ui: &mut egui::Ui) {
        let loading = matches!(self.scene, SceneState::Loading(_));
        ui.scope(|ui| {
            if loading {
                ui.disable();
            }
            if ui
                .button("Open photo\u{2026}")
                .on_hover_text("Pick a room photo (or drop one onto the window)")
                .clicked()
                && let Some(source) = acquire::open_dialog()
            {
                self.open_photo(source);
            }
        });

        if let SceneState::Loaded(scene) = &self.scene {
            ui.label(&scene.name);
        }
        ui.separator();
        ui.label(format!("backend: {}", self.client.label()));

        match &self.workflow {
            Workflow::Idle => {}
            Workflow::Analyzing(_) => {
                ui.spinner();
                ui.label("analyzing\u{2026}");
            }
            Workflow::Rendering(_) => {
                ui.spinner();
                ui.label("rendering\u{2026}");
            }
            Workflow::Upscaling(_) => {
                ui.spinner();
                ui.label("upscaling\u{2026}");
            }
        }

        if let Some(Err(e)) = self.save_job.get() {
            ui.colored_label(Color32::RED, format!("Save failed: {e}"));
        }
        if let Some(e) = &self.workflow_error {
            ui.colored_label(Color32::RED, e);
        }
    }

    pub(super) fn controls_ui(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);
        ui.add(
            TextEdit::multiline(&mut self.prompt)
                .desired_rows(2)
                .desired_width(f32::INFINITY)
                .hint_text("Describe the new style, or let \u{201c}Analyze room\u{201d} draft it"),
        );
        ui.horizontal(|ui| {
            let loaded = matches!(self.scene, SceneState::Loaded(_));
            let has_prompt = !self.prompt.trim().is_empty();
            let has_mask = matches!(
                &self.scene,
                SceneState::Loaded(scene) if scene.view.editor().has_strokes()
            );

            ui.scope(|ui| {
                if !loaded || self.busy() {
                    ui.disable();
                }
                if ui
                    .button("Analyze room")
                    .on_hover_text("Draft a styling prompt from the current photo")
                    .clicked()
                {
                    self.start_analyze();
                }
                ui.scope(|ui| {
                    if !has_prompt {
                        ui.disable();
                    }
                    if ui
                        .button("Generate render")
                        .on_hover_text("Restyle the whole photo")
                        .clicked()
                    {
                        self.start_render(false);
                    }
                });
                ui.scope(|ui| {
                    if !has_prompt || !has_mask {
                        ui.disable();
                    }
                    if ui
                        .button("Refine selection")
                        .on_hover_text("Repaint only the masked region")
                        .clicked()
                    {
                        self.start_render(true);
                    }
                });
                if ui.button(format!("Upscale \u{00d7}{}", super::UPSCALE_FACTOR)).clicked() {
                    self.start_upscale();
                }
            });

            ui.separator();
            if let SceneState::Loaded(scene) = &mut self.scene {
                scene.view.controls_ui(ui);
            }
        });
        ui.add_space(4.0);
    }
}
