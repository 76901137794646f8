use crate::controller::ControllerInput;
use glam::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub forward: f32,
    #[serde(default)]
    pub strafe: f32,
    #[serde(default)]
    pub jump_pressed: bool,
    /// Mouse motion in pixels, applied on every repeated step.
    #[serde(default)]
    pub look: [f32; 2],
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<ControllerInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(ControllerInput {
                    forward: frame.forward.clamp(-1.0, 1.0),
                    strafe: frame.strafe.clamp(-1.0, 1.0),
                    jump_pressed: frame.jump_pressed,
                    look_delta: Vec2::from(frame.look),
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::RigKind;
    use crate::controller::FirstPersonController;
    use crate::level::{build_scene, load_level_from_path};
    use crate::physics::PhysicsWorld;
    use glam::Vec3;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hedge_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    /// Physics world and player controller of the shipped level.
    fn shipped_start() -> (PhysicsWorld, FirstPersonController) {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels/level1.json");
        let level = load_level_from_path(&path).expect("shipped level loads");
        let mut world = PhysicsWorld::new();
        let scene = build_scene(&level, &mut world, 1.0).expect("scene builds");
        let controller = match scene.main_camera().map(|rig| &rig.kind) {
            Some(RigKind::Collidable(controller)) => *controller,
            other => panic!("main camera should be collidable, got {other:?}"),
        };
        (world, controller)
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "forward": 1.0, "repeat": 3 },
                { "strafe": -2.0, "look": [4.0, 0.0] },
                { "jump_pressed": true }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert_eq!(expanded[3].strafe, -1.0);
        assert_eq!(expanded[3].look_delta, Vec2::new(4.0, 0.0));
        assert!(expanded[4].jump_pressed);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replayed_walk_stops_flush_against_the_first_hedge() {
        let path = temp_file_path("walk");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "repeat": 90 },
                { "forward": 1.0, "repeat": 180 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let (world, mut player) = shipped_start();
        assert!((player.bounds.center() - Vec3::new(30.0, 10.0, 30.0)).length() < 1e-4);

        let inputs = replay.expanded_inputs();
        for input in &inputs[..90] {
            player.step(*input, replay.fixed_dt, &world);
        }
        assert!(player.grounded, "player should land during the idle frames");
        assert!(player.bounds.min.y.abs() < 1e-3);

        for input in &inputs[90..] {
            player.step(*input, replay.fixed_dt, &world);
        }
        // maze_wall_57 sits at z = 0 with a 15 x 1.01 deep collider, so its
        // +Z face is at 7.575.
        assert!(player.blocked);
        assert!(player.grounded);
        assert!(
            (player.bounds.min.z - 7.575).abs() < 1e-3,
            "stopped at z={}",
            player.bounds.min.z
        );
        assert!((player.bounds.center().x - 30.0).abs() < 1e-4);
        assert_eq!(player.velocity.x, 0.0);

        let _ = fs::remove_file(path);
    }
}
