//! Hedge Maze -- main loop and composition root.
//!
//! winit drives the event loop via `ApplicationHandler`. All simulation runs
//! inside `RedrawRequested` on a **fixed timestep** (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `run_due_steps()` -- per fixed step: fire key bindings, simulate
//!      unless the menu is up, deliver the step's events to sound, menu and
//!      HUD, then clear input edges so each press is consumed once
//!   3. Batch scene objects (plus collision skins) into instanced draws
//!   4. Upload camera and instances, draw with depth, composite egui on top
//!
//! Gameplay systems never call each other: key bindings, pickups and the win
//! /lose check all raise events on the bus, and the handlers react once per
//! step. The level file is watched via mtime polling and rebuilt between
//! steps; a failed reload keeps the last good level.

mod camera;
mod config;
mod controller;
mod hud;
mod input_map;
mod level;
mod manifest;
mod menu;
mod physics;
mod pickup;
#[cfg(test)]
mod replay;
mod scene;
mod sound;
mod state;

use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec2};
use image::{Rgba, RgbaImage};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use camera::RigInput;
use config::{load_config_from_path, GameConfig, DEFAULT_CONFIG_PATH};
use hedge_core::events::{EventAction, EventCategory, EventData, EventDispatcher};
use hedge_core::input::{InputState, Key};
use hedge_core::time::TimeState;
use hedge_platform::window::{set_mouse_look, PlatformConfig};
use hedge_render::batch::{DrawItem, FrameBatches};
use hedge_render::camera::Camera3D;
use hedge_render::gpu_context::GpuContext;
use hedge_render::mesh_pipeline::MeshRenderer;
use hedge_ui::{DebugStats, GameOverlay, OverlayView, UiActions};
use hud::Hud;
use input_map::{load_bindings_from_path, BindingsFile};
use level::{build_scene, load_level_from_path, LevelWatcher};
use manifest::{load_assets, load_manifest_from_path, LoadedAssets};
use menu::MenuManager;
use physics::{BodyKind, PhysicsWorld};
use pickup::collect_pickups;
use scene::{ObjectType, Scene, SceneManager};
use sound::{create_backend, SoundManager};
use state::GameStateManager;

const MENU_BACKGROUND: &str = "hedgegame";
const SKIN_TEXTURE: &str = "__white";
const SKIN_MESH: &str = "cube";
const PICK_MIN_DISTANCE: f32 = 2.0;
const PICK_MAX_DISTANCE: f32 = 100.0;
const SKY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.71,
    b: 0.92,
    a: 1.0,
};

/// All mutable game state. Constructed lazily in `ApplicationHandler::resumed`
/// once the window and GPU surface are available.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    renderer: MeshRenderer,
    overlay: GameOverlay,
    config: GameConfig,

    // --- Content ----------------------------------------------------------------
    assets: LoadedAssets,
    bindings: BindingsFile,
    level_watcher: LevelWatcher,
    scenes: SceneManager,
    world: PhysicsWorld,

    // --- Event handlers ---------------------------------------------------------
    events: EventDispatcher,
    sound: SoundManager,
    menu: MenuManager,
    hud: Hud,
    game_state: GameStateManager,

    show_collision_skins: bool,
    mouse_look: bool,
    frame: FrameBatches,
    draw_calls: u32,
}

impl GameState {
    fn new(window: Arc<Window>, config: GameConfig) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to initialise the GPU: {err}"));

        let manifest = load_manifest_from_path(&config.manifest_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load asset manifest '{}': {}",
                config.manifest_path.display(),
                err
            );
        });
        let mut assets = load_assets(&manifest)
            .unwrap_or_else(|err| panic!("Failed to load assets: {err}"));
        let sound_cues = std::mem::replace(
            &mut assets.sounds,
            hedge_core::assets::ContentDictionary::new("sound"),
        );

        let mut renderer = MeshRenderer::new(&gpu.device, &gpu.queue, gpu.surface_format);
        for (name, kind) in assets.models.iter() {
            renderer.add_mesh(&gpu.device, name, &kind.mesh_data());
        }
        for (name, texture) in assets.textures.iter() {
            renderer.add_texture(&gpu.device, &gpu.queue, name, &texture.image);
        }
        renderer.add_texture(
            &gpu.device,
            &gpu.queue,
            SKIN_TEXTURE,
            &RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255])),
        );

        let mut overlay = GameOverlay::new(&gpu.device, gpu.surface_format, &window);
        overlay.debug_visible = config.debug.show_overlay;
        let font_size = |name: &str, fallback: f32| {
            assets.fonts.get(name).map(|f| f.size).unwrap_or(fallback)
        };
        overlay.set_font_sizes(
            font_size("ui", 16.0),
            font_size("menu", 28.0),
            font_size("debug", 14.0),
        );
        let menu = MenuManager::new(&config.title, MENU_BACKGROUND, config.start_paused);
        match assets.textures.get(menu.background()) {
            Ok(texture) => {
                let (w, h) = texture.image.dimensions();
                overlay.set_menu_background([w as usize, h as usize], texture.image.as_raw());
            }
            Err(err) => log::warn!("Menu background unavailable: {err}"),
        }

        let bindings = load_bindings_from_path(&config.bindings_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load key bindings '{}': {}",
                config.bindings_path.display(),
                err
            );
        });

        let level = load_level_from_path(&config.level_path).unwrap_or_else(|err| {
            panic!(
                "Failed to load initial level '{}': {}",
                config.level_path.display(),
                err
            );
        });
        let mut world = PhysicsWorld::new();
        let mut scene = build_scene(&level, &mut world, config.mouse_sensitivity)
            .unwrap_or_else(|err| panic!("Failed to build level '{}': {err}", level.level_id));
        warn_unresolved_assets(&scene, &renderer, &assets);
        for rig in scene.cameras_mut() {
            rig.set_viewport(gpu.size.0, gpu.size.1);
        }
        let total_pickups = scene.pickups_remaining();
        let mut scenes = SceneManager::new();
        if let Err(err) = scenes
            .add(scene)
            .and_then(|()| scenes.load_scene(&level.level_id))
        {
            panic!("Failed to activate level '{}': {err}", level.level_id);
        }

        let mouse_look = !menu.is_paused();
        set_mouse_look(&window, mouse_look);

        Self {
            level_watcher: LevelWatcher::new(config.level_path.clone()),
            show_collision_skins: config.debug.show_collision_skins,
            hud: Hud::new(config.starting_health),
            sound: SoundManager::new(sound_cues, create_backend()),
            game_state: GameStateManager::new(total_pickups),
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            renderer,
            overlay,
            config,
            assets,
            bindings,
            scenes,
            world,
            events: EventDispatcher::new(),
            menu,
            mouse_look,
            frame: FrameBatches::default(),
            draw_calls: 0,
        }
    }

    fn reload_level(&mut self, reason: &str) {
        let level = match load_level_from_path(&self.config.level_path) {
            Ok(level) => level,
            Err(err) => {
                log::error!("Level reload failed ({reason}): {err}");
                return;
            }
        };
        let mut world = PhysicsWorld::new();
        let mut scene = match build_scene(&level, &mut world, self.config.mouse_sensitivity) {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("Level reload failed ({reason}): {err}");
                return;
            }
        };
        warn_unresolved_assets(&scene, &self.renderer, &self.assets);
        for rig in scene.cameras_mut() {
            rig.set_viewport(self.gpu.size.0, self.gpu.size.1);
        }

        let total_pickups = scene.pickups_remaining();
        let previous = self.scenes.active().map(|s| s.name().to_string());
        if previous.as_deref() == Some(scene.name()) {
            self.scenes.replace(scene);
        } else {
            if let Some(name) = &previous {
                self.scenes.unload(name);
            }
            if let Err(err) = self
                .scenes
                .add(scene)
                .and_then(|()| self.scenes.load_scene(&level.level_id))
            {
                log::error!("Level reload failed ({reason}): {err}");
                return;
            }
        }
        self.world = world;
        self.hud = Hud::new(self.config.starting_health);
        self.game_state.reset(total_pickups);
        self.menu.reset();
        self.sound.stop_all();
        self.events.clear();
        log::info!(
            "Level reloaded ({reason}): {} ({})",
            level.level_id,
            level.version
        );
    }

    /// Runs one fixed step. Returns false once the game asked to exit.
    fn fixed_step(&mut self) -> bool {
        if self.input.is_just_pressed(Key::F3) {
            self.overlay.toggle_debug();
        }
        if self.input.is_just_pressed(Key::F4) {
            self.toggle_collision_skins();
        }
        if self.input.is_just_pressed(Key::F5) {
            self.reload_level("manual trigger (F5)");
        }

        self.bindings.fire(&self.input, &mut self.events);

        let (dx, dy) = self.input.take_mouse_delta();
        let scroll = self.input.take_scroll();
        if !self.menu.is_paused() {
            let rig_input = RigInput {
                forward: axis(&self.input, Key::W, Key::S),
                strafe: axis(&self.input, Key::D, Key::A) + axis(&self.input, Key::Right, Key::Left),
                jump_pressed: self.input.is_just_pressed(Key::Space),
                look_delta: Vec2::new(dx as f32, dy as f32),
                scroll,
                game_time_ms: self.time.game_time_ms(),
            };
            self.simulate(&rig_input);
        }

        let delivered = self
            .events
            .dispatch(&mut [&mut self.sound, &mut self.menu, &mut self.hud]);
        let mut keep_running = true;
        for event in &delivered {
            match (event.category, event.action) {
                (EventCategory::Camera, EventAction::OnCameraCycle) => {
                    if let Some(scene) = self.scenes.active_mut() {
                        scene.cycle_cameras();
                    }
                }
                (EventCategory::Video, EventAction::OnPlay) => {
                    log::info!("Video playback is not supported; ignoring {event}");
                }
                (EventCategory::Game, EventAction::OnExit) => keep_running = false,
                _ => {}
            }
        }
        self.sound.update();

        let wants_mouse_look = !self.menu.is_paused();
        if wants_mouse_look != self.mouse_look {
            set_mouse_look(&self.window, wants_mouse_look);
            self.mouse_look = wants_mouse_look;
        }
        keep_running
    }

    fn simulate(&mut self, rig_input: &RigInput) {
        let dt = self.time.fixed_dt as f32;
        let Some(scene) = self.scenes.active_mut() else {
            return;
        };

        self.world.step(dt);
        scene.sync_bodies(&self.world);
        if let Some(rig) = scene.main_camera_mut() {
            rig.update(rig_input, dt, &self.world);
        }

        let player = scene
            .main_camera()
            .and_then(|rig| rig.controller())
            .map(|controller| controller.bounds);
        if let Some(bounds) = player {
            let contacts = self.world.contacts(bounds);
            collect_pickups(&contacts, scene, &mut self.world, &mut self.events);
        }

        let hit = scene.main_camera().and_then(|rig| {
            self.world.raycast(
                rig.camera.position,
                rig.camera.forward(),
                PICK_MIN_DISTANCE,
                PICK_MAX_DISTANCE,
                |body| {
                    matches!(
                        body.object_type,
                        ObjectType::Interactable | ObjectType::Consumable
                    )
                },
            )
        });
        if let Some(hit) = &hit {
            log::trace!("Reticule on '{}' at {:.1}", hit.owner, hit.distance);
        }
        self.hud.set_reticule(hit.is_some());

        self.time.advance_game_time();
        self.hud.update();
        self.game_state.evaluate(
            self.hud.health.current(),
            scene.pickups_remaining(),
            &mut self.events,
        );
    }

    fn toggle_collision_skins(&mut self) {
        self.show_collision_skins = !self.show_collision_skins;
        log::info!(
            "Collision skins: {}",
            if self.show_collision_skins { "ON" } else { "OFF" }
        );
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if let Some(button) = &actions.menu_button {
            if let Some(event) = self.menu.click(button) {
                self.events.raise(event);
            }
        }
        if actions.toggle_pause && !self.menu.is_game_over() {
            let action = if self.menu.is_paused() {
                EventAction::OnPlay
            } else {
                EventAction::OnPause
            };
            self.events.raise(EventData::new(EventCategory::Menu, action));
        }
        if actions.toggle_collision_skins {
            self.toggle_collision_skins();
        }
    }

    fn main_camera(&self) -> Option<(String, Camera3D)> {
        let rig = self.scenes.active()?.main_camera()?;
        Some((rig.name.clone(), rig.camera))
    }

    fn rebuild_frame(&mut self, eye: glam::Vec3) {
        let mut items = Vec::new();
        if let Some(scene) = self.scenes.active() {
            items.reserve(scene.len());
            for object in scene.objects() {
                let Some(render) = &object.renderer else {
                    continue;
                };
                items.push(DrawItem {
                    mesh: Arc::from(render.mesh.as_str()),
                    texture: Arc::from(render.texture.as_str()),
                    model: object.transform.matrix(),
                    tint: render.tint,
                    lit: render.lit,
                    translucent: render.translucent(),
                });
            }
        }
        if self.show_collision_skins {
            let mesh: Arc<str> = Arc::from(SKIN_MESH);
            let texture: Arc<str> = Arc::from(SKIN_TEXTURE);
            for skin in self.world.debug_boxes() {
                let tint = match skin.kind {
                    BodyKind::Static => [0.15, 0.9, 0.15, 0.3],
                    BodyKind::Dynamic => [0.2, 0.4, 1.0, 0.45],
                    BodyKind::Trigger => [1.0, 0.85, 0.1, 0.45],
                };
                items.push(DrawItem {
                    mesh: mesh.clone(),
                    texture: texture.clone(),
                    model: Mat4::from_scale_rotation_translation(
                        skin.bounds.half_extents() * 2.0,
                        Quat::IDENTITY,
                        skin.bounds.center(),
                    ),
                    tint,
                    lit: false,
                    translucent: true,
                });
            }
        }
        self.frame = FrameBatches::build(&items, eye);
    }

    fn render(&mut self) {
        let Some((camera_name, camera)) = self.main_camera() else {
            log::warn!("No active camera; skipping frame");
            return;
        };
        self.rebuild_frame(camera.position);
        self.renderer.update_camera(&self.gpu.queue, &camera);
        self.renderer
            .prepare(&self.gpu.device, &self.gpu.queue, &self.frame);

        let Some(frame) = self.gpu.acquire_frame() else {
            return;
        };

        let (object_count, pickups_remaining) = self
            .scenes
            .active()
            .map(|s| (s.len(), s.pickups_remaining()))
            .unwrap_or_default();
        let overlay_view = OverlayView {
            debug: Some(DebugStats {
                draw_calls: self.draw_calls,
                texture_binds: self.frame.texture_binds() as u32,
                object_count: object_count as u32,
                body_count: self.world.len() as u32,
                camera_name,
                camera_position: camera.position.to_array(),
                paused: self.menu.is_paused(),
                show_collision_skins: self.show_collision_skins,
            }),
            menu: self.menu.view(),
            hud: (!self.menu.is_paused()).then(|| self.hud.view(pickups_remaining)),
        };
        let (egui_primitives, egui_textures_delta, ui_actions) =
            self.overlay.prepare(&self.window, &self.time, &overlay_view);
        self.handle_ui_actions(ui_actions);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gpu.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            self.draw_calls = self.renderer.draw(&mut render_pass, &self.frame);
        }

        self.overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.output.present();
    }

    fn shutdown(&mut self) {
        self.sound.stop_all();
        if let Some(name) = self.scenes.active().map(|s| s.name().to_string()) {
            self.scenes.unload(&name);
        }
        self.world.clear();
        self.assets.dispose();
        set_mouse_look(&self.window, false);
        log::info!("Shutdown complete");
    }
}

/// A simulation advanced by the fixed-step clock.
trait FixedStepLoop {
    fn clock(&mut self) -> &mut TimeState;
    fn input(&mut self) -> &mut InputState;
    /// One fixed step. Returns false once the game asked to exit.
    fn step(&mut self) -> bool;
}

impl FixedStepLoop for GameState {
    fn clock(&mut self) -> &mut TimeState {
        &mut self.time
    }

    fn input(&mut self) -> &mut InputState {
        &mut self.input
    }

    fn step(&mut self) -> bool {
        self.fixed_step()
    }
}

/// Runs every step the clock owes this frame. Edge input (just pressed or
/// released) is cleared after each step, so a press is seen by exactly one
/// step however many run. A frame with no step keeps its edges for the next.
fn run_due_steps(sim: &mut impl FixedStepLoop) -> bool {
    while sim.clock().should_step() {
        let keep_running = sim.step();
        sim.input().end_frame();
        if !keep_running {
            return false;
        }
    }
    true
}

/// +1 while `positive` is held, -1 while `negative` is, 0 for both or neither.
fn axis(input: &InputState, positive: Key, negative: Key) -> f32 {
    let mut value = 0.0;
    if input.is_held(positive) {
        value += 1.0;
    }
    if input.is_held(negative) {
        value -= 1.0;
    }
    value
}

fn warn_unresolved_assets(scene: &Scene, renderer: &MeshRenderer, assets: &LoadedAssets) {
    for object in scene.objects() {
        let Some(render) = &object.renderer else {
            continue;
        };
        if !renderer.has_mesh(&render.mesh) {
            log::warn!(
                "Object '{}' uses unknown mesh '{}'; it will not be drawn",
                object.id,
                render.mesh
            );
        }
        if !assets.textures.contains(&render.texture) {
            log::warn!(
                "Object '{}' uses unknown texture '{}'; drawing with the fallback",
                object.id,
                render.texture
            );
        }
    }
}

struct App {
    config: GameConfig,
    state: Option<GameState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let platform = PlatformConfig {
            title: self.config.title.clone(),
            width: self.config.width,
            height: self.config.height,
        };
        let window = hedge_platform::window::create_window(event_loop, &platform)
            .unwrap_or_else(|err| panic!("{err}"));
        log::info!("Window created: {}x{}", platform.width, platform.height);
        self.state = Some(GameState::new(window, self.config.clone()));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if state.mouse_look {
                state.input.add_mouse_motion(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.overlay.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                state.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    if let Some(scene) = state.scenes.active_mut() {
                        for rig in scene.cameras_mut() {
                            rig.set_viewport(w, h);
                        }
                    }
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                state.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } if !egui_consumed => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                state.input.add_scroll(lines);
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.time.begin_frame();
                if state.level_watcher.should_reload() {
                    state.reload_level("file watcher");
                }

                let keep_running = run_due_steps(state);
                state.time.end_frame();
                if !keep_running {
                    log::info!("Exit requested from menu.");
                    state.shutdown();
                    event_loop.exit();
                    return;
                }

                state.render();
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        KeyCode::F5 => Some(Key::F5),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyO => Some(Key::O),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::KeyC => Some(Key::C),
        KeyCode::KeyV => Some(Key::V),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Hedge Maze starting...");

    let config = load_config_from_path(Path::new(DEFAULT_CONFIG_PATH))
        .unwrap_or_else(|err| panic!("Failed to load config '{DEFAULT_CONFIG_PATH}': {err}"));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Key bindings and the HUD stepped without a window.
    struct BindingLoop {
        time: TimeState,
        input: InputState,
        bindings: BindingsFile,
        events: EventDispatcher,
        hud: Hud,
        jumps: u32,
    }

    impl BindingLoop {
        fn new() -> Self {
            let path =
                Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/config/bindings.json");
            Self {
                time: TimeState::new(),
                input: InputState::new(),
                bindings: load_bindings_from_path(&path).expect("shipped bindings load"),
                events: EventDispatcher::new(),
                hud: Hud::new(100),
                jumps: 0,
            }
        }

        fn frame(&mut self, elapsed: Duration) -> u32 {
            self.time.advance(elapsed);
            assert!(run_due_steps(self));
            self.time.steps_this_frame
        }
    }

    impl FixedStepLoop for BindingLoop {
        fn clock(&mut self) -> &mut TimeState {
            &mut self.time
        }

        fn input(&mut self) -> &mut InputState {
            &mut self.input
        }

        fn step(&mut self) -> bool {
            self.bindings.fire(&self.input, &mut self.events);
            if self.input.is_just_pressed(Key::Space) {
                self.jumps += 1;
            }
            self.events.dispatch(&mut [&mut self.hud]);
            true
        }
    }

    #[test]
    fn a_press_fires_once_on_a_multi_step_frame() {
        let mut sim = BindingLoop::new();
        sim.input.key_down(Key::Down);
        sim.input.key_down(Key::Space);

        assert_eq!(sim.frame(Duration::from_millis(55)), 3);
        assert_eq!(sim.hud.health.current(), 99);
        assert_eq!(sim.jumps, 1);

        // Still held on the next frame: no new edge.
        assert!(sim.frame(Duration::from_millis(55)) > 0);
        assert_eq!(sim.hud.health.current(), 99);
        assert_eq!(sim.jumps, 1);
    }

    #[test]
    fn a_press_on_a_frame_without_steps_waits_for_the_next_step() {
        let mut sim = BindingLoop::new();
        sim.input.key_down(Key::Down);

        assert_eq!(sim.frame(Duration::from_millis(5)), 0);
        assert_eq!(sim.hud.health.current(), 100);

        assert_eq!(sim.frame(Duration::from_millis(15)), 1);
        assert_eq!(sim.hud.health.current(), 99);
    }

    #[test]
    fn an_exit_request_stops_the_remaining_steps() {
        struct Exiting {
            time: TimeState,
            input: InputState,
            steps: u32,
        }
        impl FixedStepLoop for Exiting {
            fn clock(&mut self) -> &mut TimeState {
                &mut self.time
            }
            fn input(&mut self) -> &mut InputState {
                &mut self.input
            }
            fn step(&mut self) -> bool {
                self.steps += 1;
                false
            }
        }

        let mut sim = Exiting {
            time: TimeState::new(),
            input: InputState::new(),
            steps: 0,
        };
        sim.input.key_down(Key::Escape);
        sim.time.advance(Duration::from_millis(100));
        assert!(!run_due_steps(&mut sim));
        assert_eq!(sim.steps, 1);
        assert!(!sim.input.is_just_pressed(Key::Escape));
    }

    #[test]
    fn every_bindable_key_has_a_keycode() {
        let mapped: Vec<Key> = [
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::Escape,
            KeyCode::Space,
            KeyCode::F3,
            KeyCode::F4,
            KeyCode::F5,
            KeyCode::KeyW,
            KeyCode::KeyA,
            KeyCode::KeyS,
            KeyCode::KeyD,
            KeyCode::KeyO,
            KeyCode::KeyP,
            KeyCode::KeyQ,
            KeyCode::KeyC,
            KeyCode::KeyV,
        ]
        .into_iter()
        .filter_map(map_key)
        .collect();
        for key in Key::ALL {
            assert!(mapped.contains(key), "{key} has no physical key");
        }
        assert_eq!(map_key(KeyCode::KeyZ), None);
    }

    #[test]
    fn opposing_keys_cancel_out() {
        let mut input = InputState::new();
        assert_eq!(axis(&input, Key::W, Key::S), 0.0);
        input.key_down(Key::W);
        assert_eq!(axis(&input, Key::W, Key::S), 1.0);
        input.key_down(Key::S);
        assert_eq!(axis(&input, Key::W, Key::S), 0.0);
        input.key_up(Key::W);
        assert_eq!(axis(&input, Key::W, Key::S), -1.0);
    }
}
