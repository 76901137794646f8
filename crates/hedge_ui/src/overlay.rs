//! egui overlay drawn on top of the 3D scene: debug window, main menu, HUD.
//!
//! egui needs a three-phase render split because
//! `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()` -- run UI logic, tessellate, collect clicked actions
//!   2. `upload()`  -- upload textures and update GPU buffers
//!   3. `paint()`   -- render into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! The overlay never mutates game state. It reads an [`OverlayView`] built by
//! the game each frame and reports clicks back as [`UiActions`].

use hedge_core::time::TimeState;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub object_count: u32,
    pub body_count: u32,
    pub camera_name: String,
    pub camera_position: [f32; 3],
    pub paused: bool,
    pub show_collision_skins: bool,
}

#[derive(Debug, Clone)]
pub struct MenuButton {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct MenuView {
    pub title: String,
    pub message: Option<String>,
    pub buttons: Vec<MenuButton>,
}

#[derive(Debug, Clone, Default)]
pub struct HudView {
    pub health: i32,
    pub max_health: i32,
    pub score: i32,
    pub pickups_remaining: usize,
    /// Pick ray currently rests on something interactable.
    pub reticule_active: bool,
    pub toast: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayView {
    pub debug: Option<DebugStats>,
    pub menu: Option<MenuView>,
    pub hud: Option<HudView>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiActions {
    /// Id of the menu button clicked this frame.
    pub menu_button: Option<String>,
    pub toggle_pause: bool,
    pub toggle_collision_skins: bool,
}

pub struct GameOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
    menu_background: Option<egui::TextureHandle>,
}

impl GameOverlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
            menu_background: None,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug overlay: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    /// Point sizes for body text, headings and the monospace debug font.
    pub fn set_font_sizes(&self, body: f32, heading: f32, monospace: f32) {
        self.egui_ctx.style_mut(|style| {
            style
                .text_styles
                .insert(egui::TextStyle::Body, egui::FontId::proportional(body));
            style
                .text_styles
                .insert(egui::TextStyle::Button, egui::FontId::proportional(body));
            style
                .text_styles
                .insert(egui::TextStyle::Heading, egui::FontId::proportional(heading));
            style
                .text_styles
                .insert(egui::TextStyle::Monospace, egui::FontId::monospace(monospace));
        });
    }

    /// Registers the RGBA8 image drawn behind the main menu.
    pub fn set_menu_background(&mut self, size: [usize; 2], rgba: &[u8]) {
        if rgba.len() != size[0] * size[1] * 4 {
            log::warn!(
                "Menu background has {} bytes, expected {}x{}x4; ignored",
                rgba.len(),
                size[0],
                size[1]
            );
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(size, rgba);
        self.menu_background = Some(self.egui_ctx.load_texture(
            "menu_background",
            image,
            egui::TextureOptions::LINEAR,
        ));
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        view: &OverlayView,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        UiActions,
    ) {
        let mut actions = UiActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let debug_visible = self.debug_visible;
        let background = self.menu_background.clone();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(hud) = &view.hud {
                hud_ui(ctx, hud);
            }
            if let Some(menu) = &view.menu {
                menu_ui(ctx, menu, background.as_ref(), &mut actions);
            }
            if debug_visible {
                debug_ui(ctx, time, view.debug.as_ref(), &mut actions);
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn debug_ui(
    ctx: &egui::Context,
    time: &TimeState,
    stats: Option<&DebugStats>,
    actions: &mut UiActions,
) {
    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", time.smoothed_fps));
            ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
            ui.label(format!("Steps this frame: {}", time.steps_this_frame));
            ui.label(format!("Game time: {:.2} s", time.game_time));
            let Some(stats) = stats else {
                return;
            };
            ui.separator();
            ui.label(format!("Draw calls: {}", stats.draw_calls));
            ui.label(format!("Texture binds: {}", stats.texture_binds));
            ui.label(format!("Objects: {}", stats.object_count));
            ui.label(format!("Bodies: {}", stats.body_count));
            ui.separator();
            ui.label(format!("Camera: {}", stats.camera_name));
            let [x, y, z] = stats.camera_position;
            ui.label(format!("Position: ({x:.1}, {y:.1}, {z:.1})"));
            ui.separator();
            ui.horizontal(|ui| {
                let pause_label = if stats.paused { "Resume" } else { "Pause" };
                if ui.button(pause_label).clicked() {
                    actions.toggle_pause = true;
                }
                let skins_label = if stats.show_collision_skins {
                    "Hide skins"
                } else {
                    "Show skins"
                };
                if ui.button(skins_label).clicked() {
                    actions.toggle_collision_skins = true;
                }
            });
        });
}

fn menu_ui(
    ctx: &egui::Context,
    menu: &MenuView,
    background: Option<&egui::TextureHandle>,
    actions: &mut UiActions,
) {
    let screen = ctx.screen_rect();
    let painter = ctx.layer_painter(egui::LayerId::background());
    match background {
        Some(texture) => {
            painter.image(
                texture.id(),
                screen,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(screen, 0.0, egui::Color32::from_rgb(18, 40, 24));
        }
    }

    egui::Area::new(egui::Id::new("main_menu"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new(&menu.title).size(40.0));
                if let Some(message) = &menu.message {
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new(message).size(22.0));
                }
                ui.add_space(24.0);
                for button in &menu.buttons {
                    let clicked = ui
                        .add_sized([220.0, 48.0], egui::Button::new(&button.label))
                        .clicked();
                    if clicked {
                        actions.menu_button = Some(button.id.clone());
                    }
                    ui.add_space(8.0);
                }
            });
        });
}

fn hud_ui(ctx: &egui::Context, hud: &HudView) {
    egui::Area::new(egui::Id::new("hud_status"))
        .anchor(egui::Align2::LEFT_TOP, [16.0, 16.0])
        .show(ctx, |ui| {
            let fraction = if hud.max_health > 0 {
                hud.health as f32 / hud.max_health as f32
            } else {
                0.0
            };
            ui.add(
                egui::ProgressBar::new(fraction.clamp(0.0, 1.0))
                    .desired_width(200.0)
                    .text(format!("Health {}/{}", hud.health, hud.max_health)),
            );
            ui.label(format!("Score: {}", hud.score));
            ui.label(format!("Pickups left: {}", hud.pickups_remaining));
        });

    if let Some(toast) = &hud.toast {
        egui::Area::new(egui::Id::new("hud_toast"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -48.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(toast).size(20.0));
            });
    }

    let center = ctx.screen_rect().center();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("reticule"),
    ));
    let (radius, color) = if hud.reticule_active {
        (10.0, egui::Color32::from_rgb(255, 210, 40))
    } else {
        (5.0, egui::Color32::WHITE)
    };
    painter.circle_stroke(center, radius, egui::Stroke::new(2.0, color));
}
