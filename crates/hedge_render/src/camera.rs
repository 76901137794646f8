use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

/// Perspective camera described by position and yaw/pitch (radians).
/// Yaw 0 looks down -Z; positive pitch looks up.
#[derive(Debug, Clone, Copy)]
pub struct Camera3D {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: (u32, u32),
}

impl Camera3D {
    pub const MIN_FOV_DEG: f32 = 20.0;
    pub const MAX_FOV_DEG: f32 = 110.0;

    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov_y_deg: 60.0,
            near: 0.1,
            far: 2500.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch).normalize()
    }

    pub fn set_fov(&mut self, fov_y_deg: f32) {
        self.fov_y_deg = fov_y_deg.clamp(Self::MIN_FOV_DEG, Self::MAX_FOV_DEG);
    }

    /// Points the camera at `target`, updating yaw and pitch.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() < 1e-8 {
            return;
        }
        let dir = dir.normalize();
        self.yaw = (-dir.x).atan2(-dir.z);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin();
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0.max(1) as f32 / self.viewport.1.max(1) as f32
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_to_rh(self.position, self.forward(), Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect(),
            self.near,
            self.far,
        );
        proj * view
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            eye: self.position.extend(1.0).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_forward_is_negative_z() {
        let camera = Camera3D::new(1280, 720);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera3D::new(1280, 720);
        camera.position = Vec3::new(30.0, 10.0, 30.0);
        let target = Vec3::new(90.0, 5.0, -5.0);
        camera.look_at(target);
        let expected = (target - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-4);
    }

    #[test]
    fn point_in_front_projects_inside_clip_volume() {
        let mut camera = Camera3D::new(800, 600);
        camera.position = Vec3::new(0.0, 2.0, 10.0);
        let clip = camera.view_proj() * Vec3::new(0.0, 2.0, 0.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn fov_is_clamped() {
        let mut camera = Camera3D::new(800, 600);
        camera.set_fov(500.0);
        assert_eq!(camera.fov_y_deg, Camera3D::MAX_FOV_DEG);
        camera.set_fov(1.0);
        assert_eq!(camera.fov_y_deg, Camera3D::MIN_FOV_DEG);
    }
}
