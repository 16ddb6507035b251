pub mod components;
pub mod constants;
pub mod icons;
pub mod images;
pub mod manager;
pub mod toast;

pub use manager::run_gui;
