//! Desktop chat window built on egui/eframe

mod app;
pub mod components;
mod theme;

pub use app::HovorApp;
pub use theme::Theme;

use crate::conversation::ConversationController;

pub const WINDOW_TITLE: &str = "Chat s GPT";

/// Open the chat window and block until it closes
pub fn run(controller: ConversationController) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 640.0])
            .with_min_inner_size([420.0, 360.0])
            .with_title(WINDOW_TITLE),
        ..Default::default()
    };

    eframe::run_native(
        "hovor",
        options,
        Box::new(|cc| Ok(Box::new(HovorApp::new(cc, controller)))),
    )
}
