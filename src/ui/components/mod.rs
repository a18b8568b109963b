pub mod confirm;
pub mod date_input;
pub mod drawer;
pub mod sidebar;
pub mod toast;
