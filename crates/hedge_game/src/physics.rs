//! Collision world for the maze.
//!
//! Every collider is reduced to an axis-aligned box. Maze walls are only
//! ever rotated by multiples of 90 degrees, so their oriented bounds are
//! exact; other rotations get the conservative enclosing box.
//!
//! Player movement uses **axis-separable move-and-slide**: X is resolved
//! against static geometry first, then Z using the corrected X, then Y
//! using both. Resolving one axis at a time stops diagonal tunnelling
//! through wall corners and lets the player slide along hedges.

use std::collections::{BTreeMap, HashSet};

use glam::{Quat, Vec3};
use hedge_core::transform::oriented_half_extents;
use serde::Deserialize;
use thiserror::Error;

use crate::scene::ObjectType;

const SKIN: f32 = 0.001;
/// Impacts slower than this stop a falling body instead of bouncing it.
const REST_SPEED: f32 = 2.0;

#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("collider has no primitive attached")]
    NoPrimitive,
    #[error("collider has {0} primitives; exactly one is supported")]
    MultiplePrimitives(usize),
    #[error("collider is already enabled")]
    AlreadyEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MaterialProperties {
    #[serde(default)]
    pub static_friction: f32,
    #[serde(default)]
    pub dynamic_friction: f32,
    #[serde(default)]
    pub restitution: f32,
}

impl MaterialProperties {
    pub const fn new(static_friction: f32, dynamic_friction: f32, restitution: f32) -> Self {
        Self {
            static_friction,
            dynamic_friction,
            restitution,
        }
    }

    /// Friction coefficients are non-negative and restitution lies in `0..=1`.
    pub fn validate(&self) -> Result<(), String> {
        if self.static_friction < 0.0 || self.dynamic_friction < 0.0 {
            return Err(format!(
                "friction must be >= 0 (static {}, dynamic {})",
                self.static_friction, self.dynamic_friction
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(format!(
                "restitution {} is outside 0..=1",
                self.restitution
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box {
        center: Vec3,
        rotation: Quat,
        size: Vec3,
    },
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// Upright capsule; `length` is the cylinder between the two caps.
    Capsule {
        center: Vec3,
        radius: f32,
        length: f32,
    },
}

impl Shape {
    pub fn bounds(&self) -> Aabb3 {
        match *self {
            Shape::Box {
                center,
                rotation,
                size,
            } => Aabb3::from_center_half(center, oriented_half_extents(rotation, size * 0.5)),
            Shape::Sphere { center, radius } => Aabb3::from_center_half(center, Vec3::splat(radius)),
            Shape::Capsule {
                center,
                radius,
                length,
            } => Aabb3::from_center_half(
                center,
                Vec3::new(radius, length * 0.5 + radius, radius),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn translated(&self, delta: Vec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Strict overlap; boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &Aabb3) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Slab test. Returns the entry distance along `dir` (unit length), or
    /// 0 when `origin` is inside the box.
    pub fn ray_distance(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Collision component: gather exactly one primitive, then enable.
#[derive(Debug, Clone, Default)]
pub struct Collider {
    primitives: Vec<(Shape, MaterialProperties)>,
    trigger: bool,
    enabled: bool,
}

impl Collider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collider that reports contacts but never moves or blocks.
    pub fn new_trigger() -> Self {
        Self {
            trigger: true,
            ..Self::default()
        }
    }

    pub fn add_primitive(&mut self, shape: Shape, material: MaterialProperties) {
        self.primitives.push((shape, material));
    }

    pub fn enable(&mut self, is_static: bool, group: u32) -> Result<BodyDesc, PhysicsError> {
        if self.enabled {
            return Err(PhysicsError::AlreadyEnabled);
        }
        let (shape, material) = match self.primitives.as_slice() {
            [] => return Err(PhysicsError::NoPrimitive),
            [only] => *only,
            many => return Err(PhysicsError::MultiplePrimitives(many.len())),
        };
        self.enabled = true;
        let kind = if is_static {
            BodyKind::Static
        } else if self.trigger {
            BodyKind::Trigger
        } else {
            BodyKind::Dynamic
        };
        Ok(BodyDesc {
            shape,
            material,
            kind,
            group,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub material: MaterialProperties,
    pub kind: BodyKind,
    pub group: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    /// Falls under gravity until it rests on static geometry.
    Dynamic,
    /// Immovable, non-blocking volume that only reports contacts.
    Trigger,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub owner: String,
    pub object_type: ObjectType,
    pub kind: BodyKind,
    pub material: MaterialProperties,
    pub bounds: Aabb3,
    pub velocity: Vec3,
    pub resting: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveResult {
    pub bounds: Option<Aabb3>,
    pub blocked_x: bool,
    pub blocked_z: bool,
    pub grounded: bool,
    pub hit_ceiling: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub owner: String,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugBox {
    pub bounds: Aabb3,
    pub kind: BodyKind,
}

pub struct PhysicsWorld {
    pub gravity: f32,
    bodies: BTreeMap<BodyId, Body>,
    next_id: u32,
    touching: HashSet<BodyId>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: -20.0,
            bodies: BTreeMap::new(),
            next_id: 0,
            touching: HashSet::new(),
        }
    }

    pub fn add_body(&mut self, owner: &str, object_type: ObjectType, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        log::debug!(
            "Body {} '{}': {:?} in group {}",
            id.0,
            owner,
            desc.kind,
            desc.group
        );
        self.bodies.insert(
            id,
            Body {
                id,
                owner: owner.to_string(),
                object_type,
                kind: desc.kind,
                material: desc.material,
                bounds: desc.shape.bounds(),
                velocity: Vec3::ZERO,
                resting: desc.kind != BodyKind::Dynamic,
            },
        );
        id
    }

    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        self.touching.remove(&id);
        self.bodies.remove(&id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.touching.clear();
    }

    fn statics(&self) -> impl Iterator<Item = &Aabb3> {
        self.bodies
            .values()
            .filter(|b| b.kind == BodyKind::Static)
            .map(|b| &b.bounds)
    }

    /// Advances dynamic bodies under gravity. Landing on static geometry
    /// reflects the vertical speed scaled by the body's restitution; once the
    /// rebound drops below [`REST_SPEED`] the body rests.
    pub fn step(&mut self, dt: f32) {
        let statics: Vec<Aabb3> = self.statics().copied().collect();
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic || body.resting {
                continue;
            }
            body.velocity.y += self.gravity * dt;
            let dy = body.velocity.y * dt;
            let (y, blocked) = resolve_axis(&statics, body.bounds, 1, dy);
            body.bounds = body
                .bounds
                .translated(Vec3::new(0.0, y - body.bounds.center().y, 0.0));
            if !blocked {
                continue;
            }
            let rebound = -body.velocity.y * body.material.restitution;
            if body.velocity.y < 0.0 && rebound >= REST_SPEED {
                body.velocity.y = rebound;
            } else {
                body.velocity = Vec3::ZERO;
                body.resting = true;
                log::debug!("Body '{}' came to rest at y={:.2}", body.owner, y);
            }
        }
    }

    /// Moves `bounds` by `delta`, sliding along static boxes.
    pub fn move_and_slide(&self, bounds: Aabb3, delta: Vec3) -> MoveResult {
        let statics: Vec<Aabb3> = self.statics().copied().collect();
        let mut moved = bounds;

        let (x, blocked_x) = resolve_axis(&statics, moved, 0, delta.x);
        moved = moved.translated(Vec3::new(x - moved.center().x, 0.0, 0.0));
        let (z, blocked_z) = resolve_axis(&statics, moved, 2, delta.z);
        moved = moved.translated(Vec3::new(0.0, 0.0, z - moved.center().z));
        let (y, blocked_y) = resolve_axis(&statics, moved, 1, delta.y);
        moved = moved.translated(Vec3::new(0.0, y - moved.center().y, 0.0));

        MoveResult {
            bounds: Some(moved),
            blocked_x,
            blocked_z,
            grounded: blocked_y && delta.y < 0.0,
            hit_ceiling: blocked_y && delta.y > 0.0,
        }
    }

    /// Bodies the player started overlapping since the last call. Only
    /// triggers and consumables report; each entry is reported once until
    /// the player leaves and re-enters.
    pub fn contacts(&mut self, player: Aabb3) -> Vec<Contact> {
        let mut now = HashSet::new();
        let mut entered = Vec::new();
        for body in self.bodies.values() {
            let reportable =
                body.kind == BodyKind::Trigger || body.object_type == ObjectType::Consumable;
            if !reportable || !body.bounds.intersects(&player) {
                continue;
            }
            now.insert(body.id);
            if !self.touching.contains(&body.id) {
                entered.push(Contact {
                    owner: body.owner.clone(),
                });
            }
        }
        self.touching = now;
        entered
    }

    /// Closest body along the ray within `[min_distance, max_distance]`
    /// that satisfies `predicate`.
    pub fn raycast<P>(
        &self,
        origin: Vec3,
        dir: Vec3,
        min_distance: f32,
        max_distance: f32,
        predicate: P,
    ) -> Option<RayHit>
    where
        P: Fn(&Body) -> bool,
    {
        let dir = dir.try_normalize()?;
        self.bodies
            .values()
            .filter(|body| predicate(body))
            .filter_map(|body| {
                let distance = body.bounds.ray_distance(origin, dir)?;
                (min_distance..=max_distance)
                    .contains(&distance)
                    .then_some((body, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(body, distance)| RayHit {
                owner: body.owner.clone(),
                distance,
            })
    }

    pub fn debug_boxes(&self) -> Vec<DebugBox> {
        self.bodies
            .values()
            .map(|b| DebugBox {
                bounds: b.bounds,
                kind: b.kind,
            })
            .collect()
    }
}

/// Resolves motion of `aabb` by `delta` along `axis` (0 = X, 1 = Y, 2 = Z).
/// Returns the new centre coordinate on that axis and whether it was blocked.
fn resolve_axis(statics: &[Aabb3], aabb: Aabb3, axis: usize, delta: f32) -> (f32, bool) {
    let center = aabb.center()[axis];
    if delta == 0.0 {
        return (center, false);
    }
    let half = aabb.half_extents()[axis];
    let mut offset = Vec3::ZERO;
    offset[axis] = delta;
    let candidate_box = shrink_off_axis(aabb.translated(offset), axis);

    let mut candidate = center + delta;
    let mut blocked = false;
    for solid in statics {
        if !candidate_box.intersects(solid) {
            continue;
        }
        if delta > 0.0 {
            let limit = solid.min[axis] - half;
            if limit < candidate {
                candidate = limit;
                blocked = true;
            }
        } else {
            let limit = solid.max[axis] + half;
            if limit > candidate {
                candidate = limit;
                blocked = true;
            }
        }
    }
    // Resolution never pushes against the direction of travel.
    if delta > 0.0 {
        candidate = candidate.max(center);
    } else {
        candidate = candidate.min(center);
    }
    (candidate, blocked)
}

/// Shrinks the box slightly on the two axes not being resolved so that
/// resting flush against a surface does not count as overlap.
fn shrink_off_axis(aabb: Aabb3, axis: usize) -> Aabb3 {
    let mut shrink = Vec3::splat(SKIN);
    shrink[axis] = 0.0;
    Aabb3 {
        min: aabb.min + shrink,
        max: aabb.max - shrink,
    }
}
