//! Input bar: voice toggle, draft field and submit button

use crate::conversation::ConversationController;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub const SEND_LABEL: &str = "Odeslat";
pub const LISTEN_LABEL: &str = "Mluvte";
pub const STOP_LISTENING_LABEL: &str = "Zastavit poslouchání";
const INPUT_HINT: &str = "Zadejte zprávu...";

pub struct InputBar<'a> {
    controller: &'a mut ConversationController,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(controller: &'a mut ConversationController, theme: &'a Theme) -> Self {
        Self { controller, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_voice_toggle(ui);
                    self.show_text_input(ui);
                    self.show_send_button(ui);
                });
            });
    }

    fn show_voice_toggle(&mut self, ui: &mut egui::Ui) {
        let listening = self.controller.state().is_listening;
        let (label, fill) = if listening {
            (STOP_LISTENING_LABEL, self.theme.recording)
        } else {
            (LISTEN_LABEL, self.theme.bg_tertiary)
        };

        let button = egui::Button::new(RichText::new(label).color(self.theme.text_primary))
            .min_size(Vec2::new(0.0, 36.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        if ui.add(button).clicked() {
            self.controller.toggle_voice_capture();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let width = (ui.available_width() - 110.0).max(80.0);
        let text_edit = egui::TextEdit::singleline(self.controller.draft_mut())
            .hint_text(INPUT_HINT)
            .desired_width(width)
            .id(egui::Id::new("message_input"))
            .margin(egui::Margin::symmetric(10.0, 8.0));

        let response = ui.add(text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, true, "Message input")
        });

        // Enter inside the field submits, like a form
        if response.lost_focus()
            && ui.input(|i| i.key_pressed(Key::Enter))
            && self.controller.submit_draft()
        {
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.controller.state().is_loading;
        let button = egui::Button::new(RichText::new(SEND_LABEL).color(egui::Color32::WHITE))
            .min_size(Vec2::new(0.0, 36.0))
            .rounding(self.theme.button_rounding)
            .fill(if enabled {
                self.theme.primary
            } else {
                self.theme.text_muted
            });

        if ui.add_enabled(enabled, button).clicked() {
            self.controller.submit_draft();
        }
    }
}
