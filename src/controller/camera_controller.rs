use glam::Vec3;

use crate::controller::input::FlyInput;
use crate::model::camera::Camera;
use crate::model::player::Player;

pub const FOLLOW_OFFSET: Vec3 = Vec3::new(10.0, 0.0, -0.75);
pub const DEFAULT_FOV_DEGREES: f32 = 60.0;
pub const MAX_FLY_PITCH_DEGREES: f32 = 85.0;
pub const MAX_FLY_ROLL_DEGREES: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    PlayerFollow,
    FreeFly,
}

/// Handles camera movement and orientation
#[derive(Debug, Clone)]
pub struct CameraController {
    pub mode: CameraMode,
    pub move_speed: f32,
    pub boost_factor: f32,
    /// Degrees per pixel of mouse motion
    pub mouse_sensitivity: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self { mode: CameraMode::PlayerFollow, move_speed: 2.0, boost_factor: 10.0, mouse_sensitivity: 0.08 }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            CameraMode::PlayerFollow => CameraMode::FreeFly,
            CameraMode::FreeFly => CameraMode::PlayerFollow,
        };
        tracing::info!("Camera mode: {:?}", self.mode);
    }

    /// Sits behind and slightly above the player, looking the way it faces
    pub fn follow_player(&self, camera: &mut Camera, player: &Player) {
        camera.position = player.position - FOLLOW_OFFSET;
        camera.orientation = player.orientation;
        let fov = player.definition().camera_fov;
        camera.fov_y_degrees = if fov > 0.0 { fov } else { DEFAULT_FOV_DEGREES };
    }

    /// Apply mouse look delta to camera
    pub fn apply_look(&self, camera: &mut Camera, dx: f32, dy: f32) {
        let o = &mut camera.orientation;
        o.yaw_degrees -= dx * self.mouse_sensitivity;
        o.pitch_degrees = (o.pitch_degrees + dy * self.mouse_sensitivity)
            .clamp(-MAX_FLY_PITCH_DEGREES, MAX_FLY_PITCH_DEGREES);
        o.roll_degrees = o.roll_degrees.clamp(-MAX_FLY_ROLL_DEGREES, MAX_FLY_ROLL_DEGREES);
    }

    /// Moves along the camera's forward and left axes and the world up axis
    pub fn update_movement(&self, camera: &mut Camera, fly: &FlyInput, dt: f32) {
        let mut speed = self.move_speed * dt;
        if fly.boost {
            speed *= self.boost_factor;
        }
        let basis = camera.basis();
        let cam_move = basis.x_axis * fly.forward + basis.y_axis * fly.left + Vec3::Z * fly.up;
        camera.position += cam_move * speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definitions::PlayerDefinition;
    use crate::model::geometry::EulerAngles;
    use std::rc::Rc;

    #[test]
    fn test_follow_offset_and_fov_fallback() {
        let player = Player::new(Rc::new(PlayerDefinition::default()), Vec3::new(20.0, 1.0, 3.0), EulerAngles::ZERO);
        let mut camera = Camera::new(800, 400);
        CameraController::new().follow_player(&mut camera, &player);
        assert_eq!(camera.position, Vec3::new(10.0, 1.0, 3.75));
        assert_eq!(camera.fov_y_degrees, DEFAULT_FOV_DEGREES);
    }

    #[test]
    fn test_look_clamps_pitch_and_roll() {
        let controller = CameraController::new();
        let mut camera = Camera::new(1, 1);
        camera.orientation.roll_degrees = 90.0;
        controller.apply_look(&mut camera, 100.0, 5000.0);
        assert!((camera.orientation.yaw_degrees + 8.0).abs() < 1e-4);
        assert_eq!(camera.orientation.pitch_degrees, MAX_FLY_PITCH_DEGREES);
        assert_eq!(camera.orientation.roll_degrees, MAX_FLY_ROLL_DEGREES);
    }

    #[test]
    fn test_boosted_movement() {
        let controller = CameraController::new();
        let mut camera = Camera::new(1, 1);
        let fly = FlyInput { forward: 1.0, left: 0.0, up: -1.0, boost: true };
        controller.update_movement(&mut camera, &fly, 0.5);
        assert!((camera.position - Vec3::new(10.0, 0.0, -10.0)).length() < 1e-4);
    }

    #[test]
    fn test_toggle_mode() {
        let mut controller = CameraController::new();
        controller.toggle_mode();
        assert_eq!(controller.mode, CameraMode::FreeFly);
        controller.toggle_mode();
        assert_eq!(controller.mode, CameraMode::PlayerFollow);
    }
}
