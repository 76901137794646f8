use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Translation, rotation and scale of a scene object.
///
/// Rotation is authored in degrees as `(pitch about X, yaw about Y, roll
/// about Z)` and applied yaw first, then pitch, then roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation_deg: Vec3,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform3D {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation_deg: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation_deg: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_deg,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.rotation_deg.y.to_radians(),
            self.rotation_deg.x.to_radians(),
            self.rotation_deg.z.to_radians(),
        )
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
    }

    /// Bounds of a unit cube (extent 1, centered) under this transform.
    pub fn world_aabb(&self) -> (Vec3, Vec3) {
        let half = oriented_half_extents(self.rotation(), self.scale * 0.5);
        (self.translation - half, self.translation + half)
    }
}

/// Half extents of the axis-aligned box enclosing a rotated box.
pub fn oriented_half_extents(rotation: Quat, half_size: Vec3) -> Vec3 {
    let m = Mat3::from_quat(rotation);
    let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
    abs * half_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn identity_aabb_is_unit_cube() {
        let (min, max) = Transform3D::IDENTITY.world_aabb();
        assert!(approx(min, Vec3::splat(-0.5)));
        assert!(approx(max, Vec3::splat(0.5)));
    }

    #[test]
    fn yaw_90_swaps_x_and_z_extents() {
        let t = Transform3D::new(
            Vec3::new(20.0, 2.0, 10.0),
            Vec3::new(0.0, 90.0, 0.0),
            Vec3::new(5.0, 10.0, 15.0),
        );
        let (min, max) = t.world_aabb();
        assert!(approx(max - min, Vec3::new(15.0, 10.0, 5.0)));
        assert!(approx((min + max) * 0.5, t.translation));
    }

    #[test]
    fn pitch_180_keeps_extent_magnitudes() {
        let t = Transform3D::new(
            Vec3::new(30.0, 2.0, 0.0),
            Vec3::new(180.0, 0.0, 0.0),
            Vec3::new(5.0, 10.0, 15.0),
        );
        let (min, max) = t.world_aabb();
        assert!(approx(max - min, Vec3::new(5.0, 10.0, 15.0)));
    }

    #[test]
    fn matrix_maps_origin_to_translation() {
        let t = Transform3D::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 45.0, 0.0),
            Vec3::splat(2.0),
        );
        assert!(approx(t.matrix().transform_point3(Vec3::ZERO), t.translation));
    }
}
