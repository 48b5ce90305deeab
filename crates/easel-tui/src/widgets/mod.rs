pub mod countdown_bar;
pub mod pane_chrome;
pub mod scroll;
pub mod status_bar;
pub mod toast;
