pub mod window;

pub use window::{create_window, set_mouse_look, PlatformConfig};
