use glam::{Mat3, Mat4, Vec3};

use crate::model::geometry::EulerAngles;

/// Perspective camera in the Z-up world. Looks along its forward (I) basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: EulerAngles,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: EulerAngles::ZERO,
            fov_y_degrees: 60.0,
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn basis(&self) -> Mat3 {
        self.orientation.to_mat3()
    }

    pub fn forward(&self) -> Vec3 {
        self.basis().x_axis
    }

    pub fn target(&self) -> Vec3 {
        self.position + self.forward()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target(), self.basis().z_axis);
        let proj = Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.z_near, self.z_far);
        proj * view
    }

    /// Yaw and pitch toward `target`, roll cleared
    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.orientation = EulerAngles::new(
            dir.y.atan2(dir.x).to_degrees(),
            (-dir.z).asin().to_degrees().clamp(-85.0, 85.0),
            0.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_proj_centers_target() {
        let mut cam = Camera::new(800, 600);
        cam.position = Vec3::new(-10.0, 0.0, 0.75);
        let clip = cam.view_proj() * (cam.position + Vec3::X * 5.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(clip.w > 0.0);
    }

    #[test]
    fn test_up_in_world_is_up_on_screen() {
        let cam = Camera::new(800, 600);
        let clip = cam.view_proj() * Vec3::new(5.0, 0.0, 1.0).extend(1.0);
        assert!(clip.y / clip.w > 0.0);
        // +Y is left, so it lands left of center
        let clip = cam.view_proj() * Vec3::new(5.0, 1.0, 0.0).extend(1.0);
        assert!(clip.x / clip.w < 0.0);
    }

    #[test]
    fn test_set_look_at() {
        let mut cam = Camera::new(1, 1);
        cam.set_look_at(Vec3::new(0.0, 5.0, 0.0));
        assert!((cam.orientation.yaw_degrees - 90.0).abs() < 1e-3);
        cam.set_look_at(Vec3::new(1.0, 0.0, -1.0));
        assert!((cam.orientation.pitch_degrees - 45.0).abs() < 1e-3);
        assert!((cam.forward() - Vec3::new(1.0, 0.0, -1.0).normalize()).length() < 1e-4);
    }
}
