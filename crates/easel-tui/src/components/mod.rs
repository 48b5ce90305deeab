pub mod analysis_panel;
pub mod art_panel;
pub mod header;
pub mod help_overlay;
pub mod log_panel;
pub mod poem_panel;
