pub mod banner;
pub mod confirm;
pub mod progress;
pub mod render;
pub mod tui;

pub use confirm::InquireConfirmation;
pub use tui::TuiInputPort;

/// Prints the welcome banner and applies the colored theme for all subsequent inquire
/// prompts. Call once at startup.
pub fn init_ui(store_label: &str) {
    banner::print_welcome(store_label);
    inquire::set_global_render_config(inquire::ui::RenderConfig::default_colored());
}
