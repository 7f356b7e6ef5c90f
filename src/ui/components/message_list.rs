//! Scrolling transcript
//!
//! Each message renders as a speaker label plus a bubble. The bubble's
//! accessible name is "<speaker> <content>" so every row is addressable.

use crate::conversation::ConversationState;
use crate::messages::{Message, Role};
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText};

pub const TYPING_INDICATOR: &str = "GPT píše...";

/// Speaker prefix shown above a message
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "Vy:",
        Role::Assistant => "GPT:",
        Role::System => "Systém:",
    }
}

pub struct MessageList<'a> {
    state: &'a ConversationState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a ConversationState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .id_salt("transcript")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_space(self.theme.spacing_sm);

                for message in &self.state.messages {
                    self.show_message(ui, message);
                    ui.add_space(self.theme.spacing_sm);
                }

                if self.state.is_loading {
                    ui.label(
                        RichText::new(TYPING_INDICATOR)
                            .italics()
                            .color(self.theme.text_muted),
                    );
                }
            });
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &Message) {
        let (fill, text_color, align) = match message.role() {
            Role::User => (self.theme.user_bubble, Color32::WHITE, Align::RIGHT),
            Role::Assistant => (self.theme.assistant_bubble, self.theme.text_primary, Align::LEFT),
            Role::System => (self.theme.system_bubble, self.theme.text_primary, Align::LEFT),
        };
        let speaker = role_label(message.role());

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.label(
                RichText::new(speaker)
                    .size(12.0)
                    .strong()
                    .color(self.theme.text_muted),
            );

            let max_width = ui.available_width() * 0.75;
            egui::Frame::none()
                .fill(fill)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);
                    let response = ui.label(RichText::new(message.content()).color(text_color));
                    let accessible = format!("{} {}", speaker, message.content());
                    response.widget_info(|| {
                        egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &accessible)
                    });
                });
        });
    }
}
