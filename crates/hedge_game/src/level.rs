//! Level descriptor: archetypes, placements, pickups and cameras, loaded
//! from JSON and expanded into scene objects and physics bodies.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glam::{Vec2, Vec3};
use hedge_core::curve::{Curve3D, CurveLoopType, Keyframe};
use hedge_core::transform::Transform3D;
use serde::Deserialize;

use crate::camera::{CameraRig, CurveRig, FreeLookRig, RigKind};
use crate::controller::{ControllerConfig, FirstPersonController};
use crate::physics::{Collider, MaterialProperties, PhysicsWorld, Shape};
use crate::pickup::PickupBehaviour;
use crate::scene::{GameObject, ObjectType, RenderInfo, Scene};

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    #[serde(default = "default_world_scale")]
    pub world_scale: f32,
    pub main_camera: String,
    pub cameras: Vec<CameraDef>,
    #[serde(default)]
    pub skybox: Option<SkyboxDef>,
    pub ground: ObjectDef,
    pub archetypes: Vec<ArchetypeDef>,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    #[serde(default)]
    pub pickups: Vec<PickupDef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraDef {
    pub name: String,
    pub position: Vec3,
    #[serde(default = "default_fov")]
    pub fov_deg: f32,
    #[serde(flatten)]
    pub rig: RigDef,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RigDef {
    FreeLook {
        move_speed: f32,
        strafe_speed: f32,
        look_sensitivity: Vec2,
    },
    Curve {
        #[serde(default)]
        loop_type: CurveLoopType,
        keys: Vec<Keyframe>,
        #[serde(default)]
        look_at: Option<Vec3>,
        #[serde(default = "default_fov_step")]
        fov_step_deg: f32,
    },
    Collidable {
        radius: f32,
        length: f32,
        move_speed: f32,
        strafe_speed: f32,
        jump_speed: f32,
        look_sensitivity: Vec2,
    },
}

/// Texture names for the five faces of the sky box.
#[derive(Debug, Deserialize, Clone)]
pub struct SkyboxDef {
    pub front: String,
    pub back: String,
    pub left: String,
    pub right: String,
    pub sky: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchetypeKind {
    Wall,
    Ground,
    Pickup,
    Trigger,
    #[serde(skip_deserializing)]
    Skybox,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchetypeDef {
    pub id: String,
    pub kind: ArchetypeKind,
    pub object_type: ObjectType,
    pub mesh: String,
    pub texture: String,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default = "default_lit")]
    pub lit: bool,
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub collider: Option<ColliderDef>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ColliderDef {
    pub shape: ColliderShape,
    /// Multiplier on the collision box size; walls use 1.01 so neighbours overlap.
    #[serde(default = "default_inflate")]
    pub inflate: f32,
    #[serde(default = "default_material")]
    pub material: MaterialProperties,
    pub is_static: bool,
    #[serde(default)]
    pub group: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColliderShape {
    /// Box matching the object's scale and rotation.
    Box,
    Sphere { radius: f32 },
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObjectDef {
    pub id: String,
    pub archetype: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Option<Vec3>,
    #[serde(default)]
    pub scale: Option<Vec3>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PickupDef {
    pub id: String,
    pub archetype: String,
    pub position: Vec3,
    pub description: String,
    pub value: i32,
    #[serde(default)]
    pub sound_cue: Option<String>,
}

/// One fully resolved object of the level. Immutable once expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRecord {
    pub id: String,
    pub kind: ArchetypeKind,
    pub object_type: ObjectType,
    pub transform: Transform3D,
    pub mesh: String,
    pub texture: String,
    pub tint: [f32; 4],
    pub lit: bool,
    pub collider: Option<ColliderDef>,
    pub pickup: Option<PickupBehaviour>,
}

impl LevelFile {
    pub fn archetype(&self, id: &str) -> Option<&ArchetypeDef> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    /// Expands the ground, placed objects, pickups and sky box into records,
    /// in that order.
    pub fn placements(&self) -> Vec<PlacementRecord> {
        let mut records = Vec::with_capacity(self.objects.len() + self.pickups.len() + 6);
        for object in std::iter::once(&self.ground).chain(&self.objects) {
            if let Some(record) = self.resolve(
                &object.id,
                &object.archetype,
                object.position,
                object.rotation,
                object.scale,
            ) {
                records.push(record);
            }
        }
        for pickup in &self.pickups {
            if let Some(mut record) =
                self.resolve(&pickup.id, &pickup.archetype, pickup.position, None, None)
            {
                record.pickup = Some(PickupBehaviour::new(
                    &pickup.description,
                    pickup.value,
                    pickup.sound_cue.as_deref(),
                ));
                records.push(record);
            }
        }
        if let Some(skybox) = &self.skybox {
            records.extend(skybox_records(skybox, self.world_scale));
        }
        records
    }

    fn resolve(
        &self,
        id: &str,
        archetype: &str,
        position: Vec3,
        rotation: Option<Vec3>,
        scale: Option<Vec3>,
    ) -> Option<PlacementRecord> {
        let Some(def) = self.archetype(archetype) else {
            log::warn!("Placement '{id}' skipped: unknown archetype '{archetype}'");
            return None;
        };
        let [r, g, b] = def.color;
        Some(PlacementRecord {
            id: id.to_string(),
            kind: def.kind,
            object_type: def.object_type,
            transform: Transform3D::new(
                position,
                rotation.unwrap_or(def.rotation),
                scale.unwrap_or(def.scale),
            ),
            mesh: def.mesh.clone(),
            texture: def.texture.clone(),
            tint: [r, g, b, def.alpha],
            lit: def.lit,
            collider: def.collider,
            pickup: None,
        })
    }

    /// Pairs of placements sharing an archetype and the same transform.
    pub fn duplicate_placements(&self) -> Vec<(String, String)> {
        let mut seen: HashMap<(String, [i64; 9]), String> = HashMap::new();
        let mut duplicates = Vec::new();
        for object in std::iter::once(&self.ground).chain(&self.objects) {
            let def = self.archetype(&object.archetype);
            let rotation = object
                .rotation
                .or(def.map(|d| d.rotation))
                .unwrap_or(Vec3::ZERO);
            let scale = object
                .scale
                .or(def.map(|d| d.scale))
                .unwrap_or(Vec3::ONE);
            let key = (
                object.archetype.clone(),
                quantize([object.position, rotation, scale]),
            );
            match seen.get(&key) {
                Some(first) => duplicates.push((first.clone(), object.id.clone())),
                None => {
                    seen.insert(key, object.id.clone());
                }
            }
        }
        duplicates
    }
}

/// Sky box faces sit on the walls of a cube of side `world_scale` and face
/// inward.
fn skybox_records(skybox: &SkyboxDef, world_scale: f32) -> Vec<PlacementRecord> {
    let h = world_scale * 0.5;
    let faces = [
        ("skybox_back", &skybox.back, Vec3::new(0.0, 0.0, -h), Vec3::ZERO),
        ("skybox_front", &skybox.front, Vec3::new(0.0, 0.0, h), Vec3::new(0.0, 180.0, 0.0)),
        ("skybox_left", &skybox.left, Vec3::new(-h, 0.0, 0.0), Vec3::new(0.0, 90.0, 0.0)),
        ("skybox_right", &skybox.right, Vec3::new(h, 0.0, 0.0), Vec3::new(0.0, -90.0, 0.0)),
        ("skybox_sky", &skybox.sky, Vec3::new(0.0, h, 0.0), Vec3::new(90.0, -90.0, 0.0)),
    ];
    faces
        .into_iter()
        .map(|(id, texture, position, rotation)| PlacementRecord {
            id: id.to_string(),
            kind: ArchetypeKind::Skybox,
            object_type: ObjectType::Skybox,
            transform: Transform3D::new(position, rotation, Vec3::new(world_scale, world_scale, 1.0)),
            mesh: "quad".to_string(),
            texture: texture.clone(),
            tint: [1.0; 4],
            lit: false,
            collider: None,
            pickup: None,
        })
        .collect()
}

fn quantize(values: [Vec3; 3]) -> [i64; 9] {
    let mut out = [0; 9];
    for (i, v) in values.iter().enumerate() {
        for axis in 0..3 {
            out[i * 3 + axis] = (v[axis] * 100.0).round() as i64;
        }
    }
    out
}

pub struct LevelWatcher {
    level_path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl LevelWatcher {
    pub fn new(level_path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&level_path);
        Self {
            level_path,
            last_seen_modified,
        }
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.level_path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_level_from_path(level_path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(level_path)
        .map_err(|e| format!("Failed to read level file {}: {e}", level_path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", level_path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

fn validate_level(level: &LevelFile) -> Result<(), String> {
    if level.objects.is_empty() && level.pickups.is_empty() {
        return Err("Level validation failed: no objects or pickups".to_string());
    }
    if level.world_scale <= 0.0 {
        return Err("Level validation failed: world_scale must be > 0".to_string());
    }

    let mut archetype_ids = HashSet::new();
    for def in &level.archetypes {
        if !archetype_ids.insert(def.id.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate archetype id '{}'",
                def.id
            ));
        }
        if !(0.0..=1.0).contains(&def.alpha) {
            return Err(format!(
                "Level validation failed: archetype '{}' alpha {} is outside 0..=1",
                def.id, def.alpha
            ));
        }
        check_scale(&def.id, def.scale)?;
        if let Some(collider) = &def.collider {
            if collider.inflate <= 0.0 {
                return Err(format!(
                    "Level validation failed: archetype '{}' collider inflate must be > 0",
                    def.id
                ));
            }
            collider.material.validate().map_err(|e| {
                format!(
                    "Level validation failed: archetype '{}' material {e}",
                    def.id
                )
            })?;
            if let ColliderShape::Sphere { radius } = collider.shape {
                if radius <= 0.0 {
                    return Err(format!(
                        "Level validation failed: archetype '{}' sphere radius must be > 0",
                        def.id
                    ));
                }
            }
        }
    }

    let mut ids = HashSet::new();
    for object in std::iter::once(&level.ground).chain(&level.objects) {
        if !ids.insert(object.id.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate object id '{}'",
                object.id
            ));
        }
        let Some(def) = level.archetype(&object.archetype) else {
            return Err(format!(
                "Level validation failed: object '{}' references unknown archetype '{}'",
                object.id, object.archetype
            ));
        };
        if matches!(def.kind, ArchetypeKind::Pickup | ArchetypeKind::Trigger) {
            return Err(format!(
                "Level validation failed: object '{}' uses {:?} archetype '{}'; list it under pickups",
                object.id, def.kind, def.id
            ));
        }
        if let Some(scale) = object.scale {
            check_scale(&object.id, scale)?;
        }
    }
    for pickup in &level.pickups {
        if !ids.insert(pickup.id.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate object id '{}'",
                pickup.id
            ));
        }
        match level.archetype(&pickup.archetype).map(|d| d.kind) {
            Some(ArchetypeKind::Pickup | ArchetypeKind::Trigger) => {}
            Some(kind) => {
                return Err(format!(
                    "Level validation failed: pickup '{}' uses {:?} archetype '{}'",
                    pickup.id, kind, pickup.archetype
                ))
            }
            None => {
                return Err(format!(
                    "Level validation failed: pickup '{}' references unknown archetype '{}'",
                    pickup.id, pickup.archetype
                ))
            }
        }
    }

    let mut camera_names = HashSet::new();
    for camera in &level.cameras {
        if !camera_names.insert(camera.name.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate camera '{}'",
                camera.name
            ));
        }
        if let RigDef::Curve { loop_type, keys, .. } = &camera.rig {
            Curve3D::new(*loop_type, keys.clone()).map_err(|e| {
                format!(
                    "Level validation failed: camera '{}' curve: {e}",
                    camera.name
                )
            })?;
        }
    }
    if !camera_names.contains(level.main_camera.as_str()) {
        return Err(format!(
            "Level validation failed: main camera '{}' is not defined",
            level.main_camera
        ));
    }

    for (first, second) in level.duplicate_placements() {
        log::warn!(
            "Level '{}': '{}' duplicates the placement of '{}'",
            level.level_id,
            second,
            first
        );
    }
    Ok(())
}

fn check_scale(id: &str, scale: Vec3) -> Result<(), String> {
    if scale.min_element() <= 0.0 {
        return Err(format!(
            "Level validation failed: '{id}' scale {scale} must be strictly positive"
        ));
    }
    Ok(())
}

/// Builds the scene for `level`, enabling a body in `world` for every
/// collidable placement. `look_scale` multiplies every camera's mouse-look
/// sensitivity.
pub fn build_scene(
    level: &LevelFile,
    world: &mut PhysicsWorld,
    look_scale: f32,
) -> Result<Scene, String> {
    let mut scene = Scene::new(&level.level_id);
    for record in level.placements() {
        let mut object = GameObject::new(&record.id, record.object_type, record.transform);
        object.renderer = Some(RenderInfo {
            mesh: record.mesh.clone(),
            texture: record.texture.clone(),
            tint: record.tint,
            lit: record.lit,
        });
        if let Some(def) = &record.collider {
            let mut collider = if record.kind == ArchetypeKind::Trigger {
                Collider::new_trigger()
            } else {
                Collider::new()
            };
            collider.add_primitive(collision_shape(&record, def), def.material);
            let desc = collider
                .enable(def.is_static, def.group)
                .map_err(|e| format!("Object '{}': {e}", record.id))?;
            object.body = Some(world.add_body(&record.id, record.object_type, desc));
        }
        object.pickup = record.pickup;
        scene.add(object).map_err(|e| e.to_string())?;
    }

    for def in &level.cameras {
        scene
            .add_camera(camera_rig(def, look_scale)?)
            .map_err(|e| e.to_string())?;
    }
    scene
        .set_main_camera(&level.main_camera)
        .map_err(|e| e.to_string())?;

    log::info!(
        "Built level '{}': {} object(s), {} bod(ies), {} pickup(s), {} camera(s)",
        level.level_id,
        scene.len(),
        world.len(),
        scene.pickups_remaining(),
        scene.camera_count()
    );
    Ok(scene)
}

fn collision_shape(record: &PlacementRecord, def: &ColliderDef) -> Shape {
    let transform = &record.transform;
    match def.shape {
        ColliderShape::Box => Shape::Box {
            center: transform.translation,
            rotation: transform.rotation(),
            size: transform.scale * def.inflate,
        },
        ColliderShape::Sphere { radius } => Shape::Sphere {
            center: transform.translation,
            radius: radius * def.inflate * transform.scale.max_element(),
        },
    }
}

fn camera_rig(def: &CameraDef, look_scale: f32) -> Result<CameraRig, String> {
    let kind = match &def.rig {
        RigDef::FreeLook {
            move_speed,
            strafe_speed,
            look_sensitivity,
        } => RigKind::FreeLook(FreeLookRig {
            move_speed: *move_speed,
            strafe_speed: *strafe_speed,
            look_sensitivity: *look_sensitivity * look_scale,
        }),
        RigDef::Curve {
            loop_type,
            keys,
            look_at,
            fov_step_deg,
        } => RigKind::Curve(CurveRig {
            curve: Curve3D::new(*loop_type, keys.clone())
                .map_err(|e| format!("Camera '{}': {e}", def.name))?,
            look_at: *look_at,
            fov_step_deg: *fov_step_deg,
        }),
        RigDef::Collidable {
            radius,
            length,
            move_speed,
            strafe_speed,
            jump_speed,
            look_sensitivity,
        } => RigKind::Collidable(FirstPersonController::new(
            def.position,
            *radius,
            *length,
            ControllerConfig {
                move_speed: *move_speed,
                strafe_speed: *strafe_speed,
                jump_speed: *jump_speed,
                look_sensitivity: *look_sensitivity * look_scale,
                ..ControllerConfig::default()
            },
        )),
    };
    Ok(CameraRig::new(&def.name, def.position, def.fov_deg, kind))
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

const fn default_world_scale() -> f32 {
    1000.0
}

const fn default_fov() -> f32 {
    60.0
}

const fn default_fov_step() -> f32 {
    2.0
}

const fn default_alpha() -> f32 {
    1.0
}

const fn default_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

const fn default_lit() -> bool {
    true
}

const fn default_scale() -> Vec3 {
    Vec3::ONE
}

const fn default_inflate() -> f32 {
    1.0
}

const fn default_material() -> MaterialProperties {
    MaterialProperties::new(0.8, 0.8, 0.7)
}
