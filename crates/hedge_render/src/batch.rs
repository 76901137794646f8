//! CPU-side grouping of scene draws into instanced batches.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::vertex::InstanceRaw;

#[derive(Debug, Clone)]
pub struct DrawItem {
    pub mesh: Arc<str>,
    pub texture: Arc<str>,
    pub model: Mat4,
    pub tint: [f32; 4],
    pub lit: bool,
    pub translucent: bool,
}

/// A contiguous run of instances sharing mesh and texture.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub mesh: Arc<str>,
    pub texture: Arc<str>,
    pub instance_start: u32,
    pub instance_count: u32,
    pub translucent: bool,
}

#[derive(Debug, Default)]
pub struct FrameBatches {
    pub instances: Vec<InstanceRaw>,
    pub batches: Vec<DrawBatch>,
}

impl FrameBatches {
    /// Opaque items are grouped by (mesh, texture) to minimise bind switches.
    /// Translucent items follow, sorted far-to-near from `eye`.
    pub fn build(items: &[DrawItem], eye: Vec3) -> Self {
        let mut opaque: Vec<&DrawItem> = items.iter().filter(|i| !i.translucent).collect();
        opaque.sort_by(|a, b| (&a.mesh, &a.texture).cmp(&(&b.mesh, &b.texture)));

        let mut translucent: Vec<&DrawItem> = items.iter().filter(|i| i.translucent).collect();
        translucent.sort_by(|a, b| {
            let da = a.model.w_axis.truncate().distance_squared(eye);
            let db = b.model.w_axis.truncate().distance_squared(eye);
            db.total_cmp(&da)
        });

        let mut frame = FrameBatches {
            instances: Vec::with_capacity(items.len()),
            batches: Vec::with_capacity(16),
        };
        for item in opaque.into_iter().chain(translucent) {
            let start = frame.instances.len() as u32;
            frame.instances.push(InstanceRaw {
                model: item.model.to_cols_array_2d(),
                tint: item.tint,
                params: [if item.lit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
            });
            push_batch(&mut frame.batches, item, start);
        }
        frame
    }

    pub fn texture_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current: Option<&str> = None;
        for batch in &self.batches {
            let key: &str = &batch.texture;
            if current != Some(key) {
                current = Some(key);
                binds += 1;
            }
        }
        binds
    }
}

fn push_batch(batches: &mut Vec<DrawBatch>, item: &DrawItem, instance_start: u32) {
    if let Some(last) = batches.last_mut() {
        let contiguous = last.instance_start + last.instance_count == instance_start;
        if contiguous
            && last.translucent == item.translucent
            && *last.mesh == *item.mesh
            && *last.texture == *item.texture
        {
            last.instance_count += 1;
            return;
        }
    }
    batches.push(DrawBatch {
        mesh: item.mesh.clone(),
        texture: item.texture.clone(),
        instance_start,
        instance_count: 1,
        translucent: item.translucent,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(mesh: &str, texture: &str, at: Vec3, translucent: bool) -> DrawItem {
        DrawItem {
            mesh: Arc::from(mesh),
            texture: Arc::from(texture),
            model: Mat4::from_translation(at),
            tint: [1.0; 4],
            lit: true,
            translucent,
        }
    }

    #[test]
    fn merges_walls_sharing_mesh_and_texture() {
        let items = vec![
            item("cube", "grass", Vec3::X, false),
            item("sphere", "blue", Vec3::Y, false),
            item("cube", "grass", Vec3::Z, false),
        ];
        let frame = FrameBatches::build(&items, Vec3::ZERO);
        assert_eq!(frame.instances.len(), 3);
        assert_eq!(frame.batches.len(), 2);
        let cube = frame
            .batches
            .iter()
            .find(|b| &*b.mesh == "cube")
            .expect("cube batch");
        assert_eq!(cube.instance_count, 2);
    }

    #[test]
    fn translucent_items_come_last_far_to_near() {
        let items = vec![
            item("cube", "yellow", Vec3::new(1.0, 0.0, 0.0), true),
            item("cube", "grass", Vec3::ZERO, false),
            item("cube", "yellow", Vec3::new(50.0, 0.0, 0.0), true),
        ];
        let frame = FrameBatches::build(&items, Vec3::ZERO);
        assert!(!frame.batches[0].translucent);
        assert!(frame.batches[1..].iter().all(|b| b.translucent));
        assert_eq!(frame.instances[1].model[3][0], 50.0);
        assert_eq!(frame.instances[2].model[3][0], 1.0);
    }

    #[test]
    fn unlit_items_carry_zero_light_weight() {
        let mut sky = item("quad", "skybox_front", Vec3::ZERO, false);
        sky.lit = false;
        let frame = FrameBatches::build(&[sky], Vec3::ZERO);
        assert_eq!(frame.instances[0].params[0], 0.0);
        assert_eq!(frame.texture_binds(), 1);
    }
}
