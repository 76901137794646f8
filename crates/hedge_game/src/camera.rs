//! Camera rigs. Each rig owns a render camera and knows how to drive it;
//! only the scene's main rig is updated each step.

use glam::{Vec2, Vec3};
use hedge_core::curve::Curve3D;
use hedge_render::camera::Camera3D;

use crate::controller::{flat_basis, ControllerInput, FirstPersonController};
use crate::physics::PhysicsWorld;

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Per-step input shared by all rigs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RigInput {
    pub forward: f32,
    pub strafe: f32,
    pub jump_pressed: bool,
    pub look_delta: Vec2,
    /// Scroll wheel lines since the previous step.
    pub scroll: f32,
    pub game_time_ms: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FreeLookRig {
    pub move_speed: f32,
    pub strafe_speed: f32,
    pub look_sensitivity: Vec2,
}

#[derive(Debug, Clone)]
pub struct CurveRig {
    pub curve: Curve3D,
    pub look_at: Option<Vec3>,
    /// Degrees of field of view per scroll line.
    pub fov_step_deg: f32,
}

#[derive(Debug, Clone)]
pub enum RigKind {
    FreeLook(FreeLookRig),
    Curve(CurveRig),
    Collidable(FirstPersonController),
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub name: String,
    pub camera: Camera3D,
    pub kind: RigKind,
}

impl CameraRig {
    pub fn new(name: &str, position: Vec3, fov_deg: f32, kind: RigKind) -> Self {
        let mut camera = Camera3D::new(1, 1);
        camera.position = position;
        camera.set_fov(fov_deg);
        let mut rig = Self {
            name: name.to_string(),
            camera,
            kind,
        };
        rig.sync_camera();
        rig
    }

    pub fn controller(&self) -> Option<&FirstPersonController> {
        match &self.kind {
            RigKind::Collidable(controller) => Some(controller),
            _ => None,
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.viewport = (width, height);
    }

    pub fn update(&mut self, input: &RigInput, dt: f32, world: &PhysicsWorld) {
        match &mut self.kind {
            RigKind::FreeLook(rig) => {
                let camera = &mut self.camera;
                camera.yaw -= input.look_delta.x * rig.look_sensitivity.x;
                camera.pitch = (camera.pitch - input.look_delta.y * rig.look_sensitivity.y)
                    .clamp(-MAX_PITCH, MAX_PITCH);
                // Free flight: forward follows the full view direction.
                let forward = camera.forward();
                let (_, right) = flat_basis(camera.yaw);
                camera.position += forward * input.forward * rig.move_speed * dt
                    + right * input.strafe * rig.strafe_speed * dt;
            }
            RigKind::Curve(rig) => {
                self.camera.position = rig.curve.evaluate(input.game_time_ms);
                if let Some(target) = rig.look_at {
                    self.camera.look_at(target);
                }
                if input.scroll != 0.0 {
                    let fov = self.camera.fov_y_deg - input.scroll * rig.fov_step_deg;
                    self.camera.set_fov(fov);
                }
            }
            RigKind::Collidable(controller) => {
                controller.step(
                    ControllerInput {
                        forward: input.forward,
                        strafe: input.strafe,
                        jump_pressed: input.jump_pressed,
                        look_delta: input.look_delta,
                    },
                    dt,
                    world,
                );
            }
        }
        self.sync_camera();
    }

    fn sync_camera(&mut self) {
        if let RigKind::Collidable(controller) = &self.kind {
            self.camera.position = controller.eye();
            self.camera.yaw = controller.yaw;
            self.camera.pitch = controller.pitch;
        }
    }
}
