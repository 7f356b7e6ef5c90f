use crate::conversation::ConversationController;
use crate::ui::components::{InputBar, MessageList};
use crate::ui::theme::Theme;
use crate::ui::WINDOW_TITLE;
use egui::{self, CentralPanel, RichText, TopBottomPanel};
use std::time::Duration;
use tracing::{error, info};

/// Main window
pub struct HovorApp {
    controller: ConversationController,
    theme: Theme,
}

impl HovorApp {
    pub fn new(cc: &eframe::CreationContext<'_>, controller: ConversationController) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);
        Self::with_theme(controller, theme)
    }

    /// Build without an eframe context (headless harnesses)
    pub fn with_theme(controller: ConversationController, theme: Theme) -> Self {
        Self { controller, theme }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ConversationController {
        &mut self.controller
    }

    /// Apply pending events, then draw one frame
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.controller.poll_events();

        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.heading(RichText::new(WINDOW_TITLE).strong().color(self.theme.text_primary));
            });

        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                InputBar::new(&mut self.controller, &self.theme).show(ui);
            });

        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                MessageList::new(self.controller.state(), &self.theme).show(ui);
            });

        // Results arrive on channels, so keep polling while anything is pending
        let state = self.controller.state();
        if state.is_loading || state.is_listening {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}

impl eframe::App for HovorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Closing chat window");
        if let Err(e) = self.controller.shutdown() {
            error!("Shutdown failed: {}", e);
        }
    }
}
