pub mod button_editor;
pub mod button_grid;
pub mod profile_selector;
pub mod sleep_overlay;
pub mod status_bar;

pub use button_editor::{ButtonEditor, EditorAction};
pub use button_grid::GridAction;
pub use profile_selector::{ProfileAction, ProfileSelector};
pub use sleep_overlay::SleepOverlay;
pub use status_bar::{StatusAction, StatusView};
