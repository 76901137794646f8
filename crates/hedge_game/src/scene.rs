use std::collections::BTreeMap;

use hedge_core::transform::Transform3D;
use serde::Deserialize;
use thiserror::Error;

use crate::camera::CameraRig;
use crate::physics::{BodyId, BodyKind, PhysicsWorld};
use crate::pickup::PickupBehaviour;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene '{scene}' already contains an object with id '{id}'")]
    DuplicateObject { scene: String, id: String },
    #[error("scene '{scene}' already has a camera named '{name}'")]
    DuplicateCamera { scene: String, name: String },
    #[error("scene '{scene}' has no camera named '{name}'")]
    UnknownCamera { scene: String, name: String },
    #[error("scene '{0}' is already registered")]
    DuplicateScene(String),
    #[error("no scene named '{0}'")]
    UnknownScene(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Interactable,
    Consumable,
    Ground,
    Skybox,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderInfo {
    pub mesh: String,
    pub texture: String,
    pub tint: [f32; 4],
    pub lit: bool,
}

impl RenderInfo {
    pub fn translucent(&self) -> bool {
        self.tint[3] < 1.0
    }
}

#[derive(Debug, Clone)]
pub struct GameObject {
    pub id: String,
    pub object_type: ObjectType,
    pub transform: Transform3D,
    pub renderer: Option<RenderInfo>,
    pub body: Option<BodyId>,
    pub pickup: Option<PickupBehaviour>,
}

impl GameObject {
    pub fn new(id: &str, object_type: ObjectType, transform: Transform3D) -> Self {
        Self {
            id: id.to_string(),
            object_type,
            transform,
            renderer: None,
            body: None,
            pickup: None,
        }
    }
}

pub struct Scene {
    name: String,
    objects: BTreeMap<String, GameObject>,
    cameras: Vec<CameraRig>,
    main_camera: usize,
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            objects: BTreeMap::new(),
            cameras: Vec::new(),
            main_camera: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, object: GameObject) -> Result<(), SceneError> {
        if self.objects.contains_key(&object.id) {
            return Err(SceneError::DuplicateObject {
                scene: self.name.clone(),
                id: object.id,
            });
        }
        self.objects.insert(object.id.clone(), object);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<GameObject> {
        self.objects.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&GameObject> {
        self.objects.get(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn pickups_remaining(&self) -> usize {
        self.objects.values().filter(|o| o.pickup.is_some()).count()
    }

    /// Copies body positions back onto objects whose bodies can move.
    pub fn sync_bodies(&mut self, world: &PhysicsWorld) {
        for object in self.objects.values_mut() {
            let Some(body) = object.body.and_then(|id| world.body(id)) else {
                continue;
            };
            if body.kind == BodyKind::Dynamic {
                object.transform.translation = body.bounds.center();
            }
        }
    }

    pub fn add_camera(&mut self, rig: CameraRig) -> Result<(), SceneError> {
        if self.cameras.iter().any(|c| c.name == rig.name) {
            return Err(SceneError::DuplicateCamera {
                scene: self.name.clone(),
                name: rig.name,
            });
        }
        self.cameras.push(rig);
        Ok(())
    }

    pub fn set_main_camera(&mut self, name: &str) -> Result<(), SceneError> {
        let index = self
            .cameras
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SceneError::UnknownCamera {
                scene: self.name.clone(),
                name: name.to_string(),
            })?;
        self.main_camera = index;
        log::info!("Scene '{}' main camera: {}", self.name, name);
        Ok(())
    }

    /// Makes the next camera the main one, wrapping around.
    pub fn cycle_cameras(&mut self) -> Option<&str> {
        if self.cameras.is_empty() {
            return None;
        }
        self.main_camera = (self.main_camera + 1) % self.cameras.len();
        let name = self.cameras[self.main_camera].name.as_str();
        log::info!("Camera: {}", name);
        Some(name)
    }

    pub fn main_camera(&self) -> Option<&CameraRig> {
        self.cameras.get(self.main_camera)
    }

    pub fn main_camera_mut(&mut self) -> Option<&mut CameraRig> {
        self.cameras.get_mut(self.main_camera)
    }

    pub fn cameras_mut(&mut self) -> impl Iterator<Item = &mut CameraRig> {
        self.cameras.iter_mut()
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }
}

#[derive(Default)]
pub struct SceneManager {
    scenes: BTreeMap<String, Scene>,
    active: Option<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scene: Scene) -> Result<(), SceneError> {
        if self.scenes.contains_key(scene.name()) {
            return Err(SceneError::DuplicateScene(scene.name().to_string()));
        }
        self.scenes.insert(scene.name().to_string(), scene);
        Ok(())
    }

    pub fn load_scene(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.scenes.contains_key(name) {
            return Err(SceneError::UnknownScene(name.to_string()));
        }
        self.active = Some(name.to_string());
        log::info!("Active scene: {}", name);
        Ok(())
    }

    /// Replaces a registered scene in place, keeping it active if it was.
    pub fn replace(&mut self, scene: Scene) {
        self.scenes.insert(scene.name().to_string(), scene);
    }

    /// Drops a scene and all of its objects.
    pub fn unload(&mut self, name: &str) -> Option<Scene> {
        let scene = self.scenes.remove(name)?;
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        log::info!(
            "Unloaded scene '{}' ({} object(s))",
            name,
            scene.len()
        );
        Some(scene)
    }

    pub fn active(&self) -> Option<&Scene> {
        self.scenes.get(self.active.as_deref()?)
    }

    pub fn active_mut(&mut self) -> Option<&mut Scene> {
        let name = self.active.as_deref()?;
        self.scenes.get_mut(name)
    }
}
