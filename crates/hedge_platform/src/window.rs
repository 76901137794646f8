use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::dpi::LogicalSize;
use winit::window::{CursorGrabMode, Window, WindowAttributes};

/// Smallest window the menu layout still fits in.
const MIN_SIZE: LogicalSize<u32> = LogicalSize::new(640, 360);

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(LogicalSize::new(
            config.width.max(MIN_SIZE.width),
            config.height.max(MIN_SIZE.height),
        ))
        .with_min_inner_size(MIN_SIZE);

    let window = event_loop
        .create_window(attrs)
        .map_err(|e| format!("Failed to create window '{}': {e}", config.title))?;
    Ok(Arc::new(window))
}

/// Locks and hides the cursor for mouse-look, or releases it for menus.
///
/// Platforms differ in which grab modes they support (macOS only locks,
/// X11 only confines), so both are tried before giving up.
pub fn set_mouse_look(window: &Window, enabled: bool) {
    if enabled {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(err) = grabbed {
            log::warn!("Cursor grab unavailable: {err}");
        }
    } else if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
        log::warn!("Cursor release failed: {err}");
    }
    window.set_cursor_visible(!enabled);
}
