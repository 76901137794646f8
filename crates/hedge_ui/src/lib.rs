pub mod overlay;

pub use overlay::{DebugStats, GameOverlay, HudView, MenuButton, MenuView, OverlayView, UiActions};
