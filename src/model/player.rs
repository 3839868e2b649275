use std::rc::Rc;

use glam::{Mat3, Vec3};

use crate::model::animation::{AnimationGroup, PlaybackMode};
use crate::model::clock::Clock;
use crate::model::definitions::PlayerDefinition;
use crate::model::geometry::{EulerAngles, ZCylinder};
use crate::model::level::Level;

pub const GRAVITY: f32 = -24.0;
pub const MAX_FALL_SPEED: f32 = -30.0;
pub const MAX_PITCH_DEGREES: f32 = 85.0;
pub const SHADOW_MAX_DISTANCE: f32 = 100.0;
pub const SHADOW_OFFSET: f32 = 0.1;

/// Movement intent for one tick, already resolved from key bindings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub jump_pressed: bool,
}

/// The runner: a vertical cylinder that moves forward on its own and
/// strafes and jumps on input.
#[derive(Debug)]
pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: EulerAngles,
    pub grounded: bool,
    pub physics_radius: f32,
    pub physics_height: f32,
    pub draw_debug: bool,
    pub show_shadow: bool,
    definition: Rc<PlayerDefinition>,
    anim_group: Option<usize>,
    animation_clock: Clock,
    turning: bool,
}

impl Player {
    pub fn new(definition: Rc<PlayerDefinition>, position: Vec3, orientation: EulerAngles) -> Self {
        let anim_group = (definition.visible && !definition.animation_groups.is_empty()).then_some(0);
        Self {
            position,
            velocity: Vec3::ZERO,
            orientation,
            grounded: false,
            physics_radius: definition.physics_radius,
            physics_height: definition.physics_height,
            draw_debug: false,
            show_shadow: true,
            definition,
            anim_group,
            animation_clock: Clock::new(),
            turning: false,
        }
    }

    pub fn definition(&self) -> &PlayerDefinition {
        &self.definition
    }

    pub fn cylinder(&self) -> ZCylinder {
        ZCylinder::new(self.position, self.physics_radius, self.physics_height)
    }

    /// Forward/left/up basis built from the orientation
    pub fn basis(&self) -> Mat3 {
        self.orientation.to_mat3()
    }

    pub fn update(&mut self, delta_seconds: f32, input: &PlayerInput) {
        if self.definition.simulated {
            self.apply_input(input);

            self.velocity.z += GRAVITY * delta_seconds;
            self.velocity.z = self.velocity.z.clamp(MAX_FALL_SPEED, self.definition.jump_force.max(MAX_FALL_SPEED));
            self.position += self.velocity * delta_seconds;
        }

        if self.anim_group.is_some() {
            self.update_animation(delta_seconds);
        }
    }

    fn apply_input(&mut self, input: &PlayerInput) {
        let basis = self.basis();
        let forward = basis.x_axis;
        let left = basis.y_axis;
        let strafe_speed = self.definition.strafe_speed;

        if input.jump_pressed && self.grounded {
            self.play_animation("Jump");
            self.velocity.z = self.definition.jump_force;
            self.grounded = false;
        }

        let mut horizontal = forward * self.definition.move_speed;

        if !self.grounded || input.jump_pressed {
            if input.strafe_left {
                horizontal += left * strafe_speed;
            }
            if input.strafe_right {
                horizontal -= left * strafe_speed;
            }
        } else if input.strafe_left {
            self.play_animation("TurnLeft");
            horizontal += left * strafe_speed;
            self.turning = true;
        } else if input.strafe_right {
            self.play_animation("TurnRight");
            horizontal -= left * strafe_speed;
            self.turning = true;
        } else if self.turning {
            self.play_animation("Walk");
            self.turning = false;
        }

        self.velocity = Vec3::new(horizontal.x, horizontal.y, self.velocity.z);
        self.orientation.pitch_degrees = self.orientation.pitch_degrees.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    }

    fn update_animation(&mut self, delta_seconds: f32) {
        let Some(current) = self.anim_group else { return };
        let group = &self.definition.animation_groups[current];

        if group.mode == PlaybackMode::Once && current != 0 && self.animation_clock.total_seconds() > group.duration() {
            tracing::debug!("Animation {} finished, back to {}", group.name, self.definition.animation_groups[0].name);
            self.anim_group = Some(0);
            self.animation_clock.reset();
        }

        let group = &self.definition.animation_groups[self.anim_group.unwrap_or(0)];
        let scale = if group.scale_by_speed && self.definition.move_speed > 0.0 {
            self.velocity.length() / self.definition.move_speed
        } else {
            1.0
        };
        self.animation_clock.set_time_scale(scale);
        self.animation_clock.advance(delta_seconds);
    }

    /// Switches to the group named `name`; restarting only when it changes
    pub fn play_animation(&mut self, name: &str) {
        if self.anim_group.is_none() {
            return;
        }
        if let Some((index, _)) = self.definition.animation_group(name) {
            if self.anim_group != Some(index) {
                tracing::debug!("Playing animation {}", name);
                self.anim_group = Some(index);
                self.animation_clock.reset();
            }
        }
    }

    pub fn animation_group(&self) -> Option<&AnimationGroup> {
        self.anim_group.map(|i| &self.definition.animation_groups[i])
    }

    pub fn animation_seconds(&self) -> f32 {
        self.animation_clock.total_seconds()
    }

    /// Sprite cell to draw when seen from `camera_position`
    pub fn sprite_frame(&self, camera_position: Vec3) -> Option<i32> {
        let group = self.animation_group()?;
        let to_player = (self.position - camera_position).truncate().normalize_or_zero().extend(0.0);
        let viewing_direction = self.basis().transpose() * to_player;
        let anim = group.anim_for_direction(viewing_direction)?;
        Some(anim.frame_at(self.animation_clock.total_seconds()))
    }

    pub fn respawn(&mut self) {
        tracing::debug!("Respawning {} from {:?}", self.definition.name, self.position);
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.orientation = EulerAngles::ZERO;
        self.grounded = false;
    }

    pub fn toggle_debug_draw(&mut self) {
        self.draw_debug = !self.draw_debug;
    }

    pub fn toggle_shadow(&mut self) {
        self.show_shadow = !self.show_shadow;
    }

    /// Where the drop shadow sits this frame: only while airborne and only
    /// over a block.
    pub fn shadow_position(&self, level: &Level) -> Option<Vec3> {
        if self.grounded || !self.show_shadow {
            return None;
        }
        level
            .raycast_down(self.position, SHADOW_MAX_DISTANCE)
            .map(|impact| impact + Vec3::new(0.0, 0.0, SHADOW_OFFSET))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNER: &str = r#"
        <PlayerDefinition name="Runner" visible="true">
            <Collision physicsRadius="0.5" physicsHeight="1.8" collidesWithBlock="true"/>
            <Physics simulated="true" moveSpeed="8" strafeSpeed="6" jumpForce="10"/>
            <Visuals cellCount="4,4">
                <AnimationGroup name="Walk" secondsPerFrame="0.1" playbackMode="Loop" scaleBySpeed="true">
                    <Direction vector="1,0,0"><Animation startFrame="0" endFrame="3"/></Direction>
                    <Direction vector="-1,0,0"><Animation startFrame="12" endFrame="15"/></Direction>
                </AnimationGroup>
                <AnimationGroup name="Jump" secondsPerFrame="0.1" playbackMode="Once">
                    <Direction vector="1,0,0"><Animation startFrame="4" endFrame="5"/></Direction>
                </AnimationGroup>
                <AnimationGroup name="TurnLeft" secondsPerFrame="0.1" playbackMode="Loop">
                    <Direction vector="1,0,0"><Animation startFrame="6" endFrame="7"/></Direction>
                </AnimationGroup>
                <AnimationGroup name="TurnRight" secondsPerFrame="0.1" playbackMode="Loop">
                    <Direction vector="1,0,0"><Animation startFrame="8" endFrame="9"/></Direction>
                </AnimationGroup>
            </Visuals>
        </PlayerDefinition>"#;

    fn runner() -> Player {
        let doc = roxmltree::Document::parse(RUNNER).unwrap();
        let def = PlayerDefinition::from_xml(doc.root_element()).unwrap();
        Player::new(Rc::new(def), Vec3::ZERO, EulerAngles::ZERO)
    }

    fn group_name(player: &Player) -> &str {
        player.animation_group().map(|g| g.name.as_str()).unwrap_or("")
    }

    #[test]
    fn test_runs_forward_at_move_speed() {
        let mut player = runner();
        player.grounded = true;
        player.update(0.1, &PlayerInput::default());
        assert!((player.velocity.x - 8.0).abs() < 1e-5);
        assert!((player.position.x - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_fall_speed_is_clamped() {
        let mut player = runner();
        for _ in 0..200 {
            player.update(0.1, &PlayerInput::default());
            assert!(player.velocity.z >= MAX_FALL_SPEED);
            assert!(player.velocity.z <= 10.0);
        }
        assert_eq!(player.velocity.z, MAX_FALL_SPEED);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut player = runner();
        let jump = PlayerInput { jump_pressed: true, ..Default::default() };
        player.update(0.01, &jump);
        assert!(player.velocity.z < 0.0);

        player.grounded = true;
        player.velocity.z = 0.0;
        player.update(0.01, &jump);
        assert!(!player.grounded);
        assert!((player.velocity.z - (10.0 + GRAVITY * 0.01)).abs() < 1e-4);
        assert_eq!(group_name(&player), "Jump");
    }

    #[test]
    fn test_strafe_and_turn_animations() {
        let mut player = runner();
        player.grounded = true;
        player.update(0.01, &PlayerInput { strafe_left: true, ..Default::default() });
        assert!((player.velocity.y - 6.0).abs() < 1e-5);
        assert_eq!(group_name(&player), "TurnLeft");

        player.grounded = true;
        // Left wins when both are held
        player.update(0.01, &PlayerInput { strafe_left: true, strafe_right: true, ..Default::default() });
        assert_eq!(group_name(&player), "TurnLeft");

        player.grounded = true;
        player.update(0.01, &PlayerInput::default());
        assert_eq!(group_name(&player), "Walk");
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn test_airborne_strafe_keeps_animation() {
        let mut player = runner();
        player.update(0.01, &PlayerInput { strafe_right: true, ..Default::default() });
        assert!((player.velocity.y + 6.0).abs() < 1e-5);
        assert_eq!(group_name(&player), "Walk");
    }

    #[test]
    fn test_once_animation_returns_to_default() {
        let mut player = runner();
        player.play_animation("Jump");
        assert_eq!(group_name(&player), "Jump");
        for _ in 0..8 {
            player.update(0.05, &PlayerInput::default());
        }
        assert_eq!(group_name(&player), "Walk");
    }

    #[test]
    fn test_play_same_animation_does_not_restart() {
        let mut player = runner();
        player.update(0.05, &PlayerInput::default());
        let before = player.animation_seconds();
        assert!(before > 0.0);
        player.play_animation("Walk");
        assert_eq!(player.animation_seconds(), before);
        player.play_animation("Missing");
        assert_eq!(group_name(&player), "Walk");
    }

    #[test]
    fn test_sprite_frame_depends_on_view_direction() {
        let player = runner();
        // Camera behind the player looks along +X
        assert_eq!(player.sprite_frame(Vec3::new(-10.0, 0.0, 0.0)), Some(0));
        // Camera in front looks along -X
        assert_eq!(player.sprite_frame(Vec3::new(10.0, 0.0, 0.0)), Some(12));
    }

    #[test]
    fn test_respawn_resets_state() {
        let mut player = runner();
        player.position = Vec3::new(5.0, 1.0, -50.0);
        player.velocity = Vec3::new(8.0, 0.0, -30.0);
        player.orientation = EulerAngles::new(10.0, 5.0, 0.0);
        player.grounded = true;
        player.respawn();
        assert_eq!(player.position, Vec3::ZERO);
        assert_eq!(player.velocity, Vec3::ZERO);
        assert_eq!(player.orientation, EulerAngles::ZERO);
        assert!(!player.grounded);
    }

    #[test]
    fn test_no_animation_groups_skips_animation() {
        let def = PlayerDefinition { simulated: true, move_speed: 4.0, ..Default::default() };
        let mut player = Player::new(Rc::new(def), Vec3::ZERO, EulerAngles::ZERO);
        player.play_animation("Jump");
        player.update(0.1, &PlayerInput::default());
        assert!(player.animation_group().is_none());
        assert_eq!(player.sprite_frame(Vec3::ZERO), None);
    }
}
