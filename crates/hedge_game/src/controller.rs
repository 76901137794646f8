use glam::{Vec2, Vec3};

use crate::physics::{Aabb3, MoveResult, PhysicsWorld, Shape};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInput {
    /// +1 forward, -1 back.
    pub forward: f32,
    /// +1 right, -1 left.
    pub strafe: f32,
    pub jump_pressed: bool,
    /// Mouse motion since the previous step, in pixels.
    pub look_delta: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub move_speed: f32,
    pub strafe_speed: f32,
    pub accel_ground: f32,
    pub accel_air: f32,
    pub friction_ground: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_speed: f32,
    /// Radians of yaw/pitch per pixel of mouse motion.
    pub look_sensitivity: Vec2,
    /// Eye height above the capsule centre.
    pub eye_offset: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 12.0,
            strafe_speed: 8.0,
            accel_ground: 90.0,
            accel_air: 30.0,
            friction_ground: 120.0,
            gravity: -20.0,
            max_fall_speed: -40.0,
            jump_speed: 7.0,
            look_sensitivity: Vec2::new(0.003, 0.002),
            eye_offset: 1.8,
        }
    }
}

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Collidable first-person body: an upright capsule (bounded by its box)
/// that walks, strafes, jumps and looks around.
#[derive(Debug, Clone, Copy)]
pub struct FirstPersonController {
    pub bounds: Aabb3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
    pub blocked: bool,
    pub config: ControllerConfig,
}

impl FirstPersonController {
    pub fn new(center: Vec3, radius: f32, length: f32, config: ControllerConfig) -> Self {
        Self {
            bounds: Shape::Capsule {
                center,
                radius,
                length,
            }
            .bounds(),
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            grounded: false,
            blocked: false,
            config,
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.bounds.center() + Vec3::Y * self.config.eye_offset
    }

    pub fn step(&mut self, input: ControllerInput, dt: f32, world: &PhysicsWorld) {
        self.apply_look(input.look_delta);

        let (forward, right) = flat_basis(self.yaw);
        let target = forward * input.forward.clamp(-1.0, 1.0) * self.config.move_speed
            + right * input.strafe.clamp(-1.0, 1.0) * self.config.strafe_speed;

        // Horizontal control: accelerate toward intent, friction when grounded and idle.
        let accel = if self.grounded {
            self.config.accel_ground
        } else {
            self.config.accel_air
        };
        let has_intent = input.forward != 0.0 || input.strafe != 0.0;
        if has_intent {
            self.velocity.x = move_towards(self.velocity.x, target.x, accel * dt);
            self.velocity.z = move_towards(self.velocity.z, target.z, accel * dt);
        } else if self.grounded {
            let friction = self.config.friction_ground * dt;
            self.velocity.x = move_towards(self.velocity.x, 0.0, friction);
            self.velocity.z = move_towards(self.velocity.z, 0.0, friction);
        }

        // Jump is edge-triggered and only legal from grounded state.
        if input.jump_pressed && self.grounded {
            self.velocity.y = self.config.jump_speed;
            self.grounded = false;
        }

        self.velocity.y =
            (self.velocity.y + self.config.gravity * dt).max(self.config.max_fall_speed);

        let result = world.move_and_slide(self.bounds, self.velocity * dt);
        self.apply_move_result(result);
    }

    fn apply_look(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.config.look_sensitivity.x;
        self.pitch = (self.pitch - delta.y * self.config.look_sensitivity.y)
            .clamp(-MAX_PITCH, MAX_PITCH);
    }

    fn apply_move_result(&mut self, result: MoveResult) {
        if let Some(bounds) = result.bounds {
            self.bounds = bounds;
        }
        if result.blocked_x {
            self.velocity.x = 0.0;
        }
        if result.blocked_z {
            self.velocity.z = 0.0;
        }
        self.blocked = result.blocked_x || result.blocked_z;
        if result.hit_ceiling && self.velocity.y > 0.0 {
            self.velocity.y = 0.0;
        }
        // Grounded comes from collision contact, not from a height heuristic.
        if result.grounded {
            self.velocity.y = 0.0;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }
}

/// Forward and right vectors on the ground plane for a yaw (radians).
/// Yaw 0 faces -Z.
pub fn flat_basis(yaw: f32) -> (Vec3, Vec3) {
    let (sin, cos) = yaw.sin_cos();
    (Vec3::new(-sin, 0.0, -cos), Vec3::new(cos, 0.0, -sin))
}

pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Collider, MaterialProperties, Shape};
    use crate::scene::ObjectType;
    use glam::Quat;

    fn add_box(world: &mut PhysicsWorld, center: Vec3, size: Vec3) {
        let mut collider = Collider::new();
        collider.add_primitive(
            Shape::Box {
                center,
                rotation: Quat::IDENTITY,
                size,
            },
            MaterialProperties::new(0.8, 0.8, 0.7),
        );
        let desc = collider.enable(true, 1).expect("enabled");
        world.add_body("box", ObjectType::Interactable, desc);
    }

    fn sample_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        add_box(
            &mut world,
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1000.0, 2.0, 1000.0),
        );
        // Hedge straight ahead (-Z) of the spawn.
        add_box(
            &mut world,
            Vec3::new(0.0, 2.0, -10.0),
            Vec3::new(20.0, 10.0, 2.0),
        );
        world
    }

    fn spawn() -> FirstPersonController {
        FirstPersonController::new(Vec3::new(0.0, 2.8, 0.0), 1.0, 3.6, ControllerConfig::default())
    }

    fn walk(forward: f32) -> ControllerInput {
        ControllerInput {
            forward,
            ..ControllerInput::default()
        }
    }

    #[test]
    fn settles_on_ground_from_spawn_height() {
        let world = sample_world();
        let mut controller =
            FirstPersonController::new(Vec3::new(30.0, 10.0, 30.0), 1.0, 3.6, ControllerConfig::default());
        for _ in 0..120 {
            controller.step(ControllerInput::default(), 1.0 / 60.0, &world);
        }
        assert!(controller.grounded);
        assert!((controller.bounds.min.y - 0.0).abs() < 1e-3);
    }

    #[test]
    fn deterministic_sequence_reaches_same_final_state() {
        let world = sample_world();
        let mut inputs = Vec::new();
        for _ in 0..30 {
            inputs.push(walk(1.0));
        }
        inputs.push(ControllerInput {
            forward: 1.0,
            jump_pressed: true,
            look_delta: Vec2::new(40.0, -10.0),
            ..ControllerInput::default()
        });
        for _ in 0..60 {
            inputs.push(ControllerInput {
                strafe: -1.0,
                ..walk(0.5)
            });
        }

        let dt = 1.0 / 60.0;
        let mut run_a = spawn();
        let mut run_b = spawn();
        for input in &inputs {
            run_a.step(*input, dt, &world);
        }
        for input in &inputs {
            run_b.step(*input, dt, &world);
        }

        assert!((run_a.bounds.center() - run_b.bounds.center()).length() < 1e-4);
        assert!((run_a.velocity - run_b.velocity).length() < 1e-4);
        assert_eq!(run_a.yaw, run_b.yaw);
        assert_eq!(run_a.grounded, run_b.grounded);
    }

    #[test]
    fn jump_only_activates_when_grounded() {
        let world = sample_world();
        let mut controller = spawn();
        controller.bounds = controller.bounds.translated(Vec3::Y * 5.0);
        controller.grounded = false;
        controller.step(
            ControllerInput {
                jump_pressed: true,
                ..ControllerInput::default()
            },
            1.0 / 60.0,
            &world,
        );
        assert!(controller.velocity.y <= 0.0);
    }

    #[test]
    fn walking_forward_stops_at_hedge() {
        let world = sample_world();
        let mut controller = spawn();
        let mut hit_wall = false;
        for _ in 0..180 {
            controller.step(walk(1.0), 1.0 / 60.0, &world);
            if controller.blocked {
                hit_wall = true;
                break;
            }
        }
        assert!(hit_wall, "controller should eventually hit the hedge");
        assert!(controller.bounds.min.z >= -9.0 - 1e-3);
    }

    #[test]
    fn capsule_bounds_cover_both_caps() {
        let controller = spawn();
        let half = controller.bounds.half_extents();
        assert!((half - Vec3::new(1.0, 2.8, 1.0)).length() < 1e-6);
        assert!((controller.bounds.center() - Vec3::new(0.0, 2.8, 0.0)).length() < 1e-6);
        assert!((controller.eye().y - 4.6).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped() {
        let world = sample_world();
        let mut controller = spawn();
        controller.step(
            ControllerInput {
                look_delta: Vec2::new(0.0, -100_000.0),
                ..ControllerInput::default()
            },
            1.0 / 60.0,
            &world,
        );
        assert!(controller.pitch <= MAX_PITCH + 1e-6);
    }

    #[test]
    fn flat_basis_is_right_handed() {
        let (forward, right) = flat_basis(0.0);
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
        assert!((right - Vec3::X).length() < 1e-6);
        assert!((right.cross(forward) - Vec3::Y).length() < 1e-6);
    }
}
