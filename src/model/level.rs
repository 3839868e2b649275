//! A playable level: platform blocks and the goal sphere, plus the
//! per-tick collision checks run against the player.

use glam::Vec3;

use crate::model::definitions::{LevelDefinition, LevelItem};
use crate::model::geometry::{
    do_z_cylinder_and_aabb_overlap, do_z_cylinder_and_sphere_overlap, is_z_cylinder_resting_on_aabb, raycast_vs_obb,
    z_cylinder_push_out_of_aabb, Aabb3, EulerAngles, Obb3, Rgba8,
};
use crate::model::player::Player;

/// Falling into this box sends the player back to the start
pub const DEATH_BOUNDS: Aabb3 = Aabb3 {
    mins: Vec3::new(-20.0, -20.0, -200.0),
    maxs: Vec3::new(1000.0, 1000.0, -20.0),
};

/// Maximum gap between the cylinder bottom and a block top that still counts as standing on it
pub const GROUNDED_TOLERANCE: f32 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub bounds: Obb3,
    pub color: Rgba8,
    pub orientation: EulerAngles,
}

impl Block {
    pub fn new(center: Vec3, dimensions: Vec3, orientation: EulerAngles, color: Rgba8) -> Self {
        Self { bounds: Obb3::new(center, orientation, dimensions * 0.5), color, orientation }
    }

    /// Axis-aligned box from center and half extents. Rotation is ignored,
    /// so tilted blocks collide as if they were upright.
    pub fn aligned_bounds(&self) -> Aabb3 {
        Aabb3::from_center_half_dims(self.bounds.center, self.bounds.half_dims)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndGoal {
    pub center: Vec3,
    pub radius: f32,
    pub color: Rgba8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self { sun_direction: Vec3::new(3.0, 0.0, 2.0), sun_intensity: 0.75, ambient_intensity: 0.35 }
    }
}

/// What happened to the player during [`Level::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEvent {
    None,
    Respawned,
    GoalReached,
}

#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub blocks: Vec<Block>,
    pub end_goal: Option<EndGoal>,
    pub lighting: Lighting,
    completed: bool,
}

impl Level {
    pub fn from_definition(definition: &LevelDefinition) -> Self {
        let mut blocks = Vec::new();
        let mut end_goal = None;
        for spawn in &definition.spawn_infos {
            match &spawn.item {
                LevelItem::Block => blocks.push(Block::new(spawn.center, spawn.dimensions, spawn.orientation, spawn.color)),
                LevelItem::EndGoal => {
                    end_goal = Some(EndGoal { center: spawn.center, radius: spawn.radius, color: spawn.color })
                }
                LevelItem::Other(kind) => {
                    tracing::warn!("Level {}: ignoring unknown level item \"{}\"", definition.name, kind)
                }
            }
        }
        if end_goal.is_none() {
            tracing::warn!("Level {} has no end goal and cannot be completed", definition.name);
        }
        Self { name: definition.name.clone(), blocks, end_goal, lighting: Lighting::default(), completed: false }
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Runs platform collision, then the death-bounds and goal checks
    pub fn update(&mut self, player: &mut Player) -> LevelEvent {
        if player.definition().collides_with_blocks {
            self.collide_player_with_blocks(player);
        }
        if self.check_death_bounds(player) {
            return LevelEvent::Respawned;
        }
        if self.check_end_goal(player) {
            return LevelEvent::GoalReached;
        }
        LevelEvent::None
    }

    pub fn collide_player_with_blocks(&self, player: &mut Player) {
        player.grounded = false;

        for block in &self.blocks {
            let aligned = block.aligned_bounds();
            let Some(push) = z_cylinder_push_out_of_aabb(&player.cylinder(), &aligned) else {
                // Exact contact with the top is not an overlap, so it never pushes
                if player.velocity.z <= 0.0
                    && is_z_cylinder_resting_on_aabb(&player.cylinder(), &aligned, GROUNDED_TOLERANCE)
                {
                    player.grounded = true;
                    player.velocity.z = 0.0;
                }
                continue;
            };
            player.position += push;

            let bottom = player.position.z - player.physics_height * 0.5;
            if (bottom - aligned.maxs.z).abs() < GROUNDED_TOLERANCE {
                player.grounded = true;
                player.velocity.z = 0.0;
            }

            let normal = push_normal(push);
            let into_block = player.velocity.dot(normal);
            if into_block < 0.0 {
                player.velocity.x -= normal.x * into_block;
                player.velocity.y -= normal.y * into_block;
            }
        }
    }

    /// Respawns the player when it has fallen into the void
    pub fn check_death_bounds(&self, player: &mut Player) -> bool {
        if do_z_cylinder_and_aabb_overlap(&player.cylinder(), &DEATH_BOUNDS) {
            player.respawn();
            return true;
        }
        false
    }

    pub fn check_end_goal(&mut self, player: &Player) -> bool {
        let Some(goal) = self.end_goal else { return false };
        if do_z_cylinder_and_sphere_overlap(&player.cylinder(), goal.center, goal.radius) {
            tracing::info!("Level {} complete", self.name);
            self.completed = true;
            return true;
        }
        false
    }

    /// Nearest block surface straight below `start`
    pub fn raycast_down(&self, start: Vec3, max_distance: f32) -> Option<Vec3> {
        self.blocks
            .iter()
            .filter_map(|block| raycast_vs_obb(start, Vec3::NEG_Z, max_distance, &block.bounds))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|hit| hit.position)
    }

    pub fn reset(&mut self) {
        self.completed = false;
    }
}

/// Horizontal unit normal of a push-out. Single-axis pushes give an exact
/// axis so cancelling velocity along it leaves exactly zero.
fn push_normal(push: Vec3) -> Vec3 {
    match (push.x != 0.0, push.y != 0.0) {
        (true, false) => Vec3::new(push.x.signum(), 0.0, 0.0),
        (false, true) => Vec3::new(0.0, push.y.signum(), 0.0),
        (true, true) => Vec3::new(push.x, push.y, 0.0).normalize(),
        (false, false) => Vec3::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definitions::{PlayerDefinition, SpawnInfo};
    use std::rc::Rc;

    fn player_at(position: Vec3) -> Player {
        let def = PlayerDefinition {
            name: "Runner".to_string(),
            physics_radius: 0.5,
            physics_height: 1.8,
            collides_with_blocks: true,
            simulated: true,
            move_speed: 8.0,
            strafe_speed: 6.0,
            jump_force: 10.0,
            ..Default::default()
        };
        Player::new(Rc::new(def), position, EulerAngles::ZERO)
    }

    fn spawn(item: LevelItem, center: Vec3, dimensions: Vec3, radius: f32) -> SpawnInfo {
        SpawnInfo { item, center, dimensions, orientation: EulerAngles::ZERO, radius, color: Rgba8::WHITE }
    }

    fn level() -> Level {
        let def = LevelDefinition {
            name: "Test".to_string(),
            spawn_infos: vec![
                spawn(LevelItem::Block, Vec3::new(10.0, 2.0, 1.0), Vec3::new(6.0, 6.0, 0.8), 0.0),
                spawn(LevelItem::Block, Vec3::new(10.0, 2.0, -5.0), Vec3::new(6.0, 6.0, 0.8), 0.0),
                spawn(LevelItem::EndGoal, Vec3::new(40.0, 0.0, 1.0), Vec3::ZERO, 1.0),
            ],
        };
        Level::from_definition(&def)
    }

    #[test]
    fn test_level_layout_from_definition() {
        let level = level();
        assert_eq!(level.blocks.len(), 2);
        assert_eq!(level.blocks[0].bounds.half_dims, Vec3::new(3.0, 3.0, 0.4));
        assert_eq!(level.end_goal.unwrap().radius, 1.0);
    }

    #[test]
    fn test_landing_pushes_up_and_grounds() {
        let level = level();
        let mut player = player_at(Vec3::new(10.0, 2.0, 1.9));
        player.velocity = Vec3::new(8.0, 0.0, -5.0);
        level.collide_player_with_blocks(&mut player);
        assert!((player.position.z - 2.3).abs() < 1e-4);
        assert!(player.grounded);
        assert_eq!(player.velocity.z, 0.0);
        assert_eq!(player.velocity.x, 8.0);
    }

    #[test]
    fn test_side_hit_cancels_velocity_into_block() {
        let level = level();
        // Running into the block's -X face
        let mut player = player_at(Vec3::new(6.8, 2.0, 1.0));
        player.velocity = Vec3::new(8.0, 1.0, 0.0);
        level.collide_player_with_blocks(&mut player);
        assert!((player.position.x - 6.5).abs() < 1e-4);
        assert_eq!(player.velocity.x, 0.0);
        assert_eq!(player.velocity.y, 1.0);
        assert!(!player.grounded);
    }

    #[test]
    fn test_push_normal_is_exact_on_one_axis() {
        assert_eq!(push_normal(Vec3::new(-0.3000001, 0.0, 0.0)), Vec3::NEG_X);
        assert_eq!(push_normal(Vec3::new(0.0, 0.25, 0.0)), Vec3::Y);
        assert_eq!(push_normal(Vec3::new(0.0, 0.0, 0.4)), Vec3::ZERO);
        let corner = push_normal(Vec3::new(0.3, 0.4, 0.0));
        assert!((corner - Vec3::new(0.6, 0.8, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_stays_grounded_while_resting_on_top() {
        let level = level();
        let mut player = player_at(Vec3::new(10.0, 2.0, 1.9));
        player.velocity = Vec3::new(0.0, 0.0, -5.0);
        level.collide_player_with_blocks(&mut player);
        assert!(player.grounded);

        // A paused frame moves nothing; the contact still counts
        let resting_z = player.position.z;
        level.collide_player_with_blocks(&mut player);
        assert!(player.grounded);
        assert!((player.position.z - resting_z).abs() < 1e-4);

        // Moving upward off the top is not grounded
        player.velocity.z = 10.0;
        player.position.z += 0.01;
        level.collide_player_with_blocks(&mut player);
        assert!(!player.grounded);
    }

    #[test]
    fn test_grounded_is_cleared_without_contact() {
        let level = level();
        let mut player = player_at(Vec3::new(0.0, 0.0, 10.0));
        player.grounded = true;
        level.collide_player_with_blocks(&mut player);
        assert!(!player.grounded);
    }

    #[test]
    fn test_death_bounds_respawn() {
        let mut level = level();
        let mut player = player_at(Vec3::new(50.0, 0.0, -25.0));
        assert_eq!(level.update(&mut player), LevelEvent::Respawned);
        assert_eq!(player.position, Vec3::ZERO);

        let mut safe = player_at(Vec3::new(50.0, 0.0, -10.0));
        assert!(!level.check_death_bounds(&mut safe));
    }

    #[test]
    fn test_goal_overlap_completes_level() {
        let mut level = level();
        let mut player = player_at(Vec3::new(39.2, 0.0, 1.0));
        assert_eq!(level.update(&mut player), LevelEvent::GoalReached);
        assert!(level.is_complete());
        level.reset();
        assert!(!level.is_complete());
    }

    #[test]
    fn test_level_without_goal_never_completes() {
        let def = LevelDefinition { name: "Empty".to_string(), spawn_infos: Vec::new() };
        let mut level = Level::from_definition(&def);
        let player = player_at(Vec3::ZERO);
        assert!(!level.check_end_goal(&player));
    }

    #[test]
    fn test_raycast_down_returns_nearest_top() {
        let level = level();
        let hit = level.raycast_down(Vec3::new(10.0, 2.0, 5.0), 100.0).unwrap();
        assert!((hit.z - 1.4).abs() < 1e-4);
        assert!(level.raycast_down(Vec3::new(30.0, 2.0, 5.0), 100.0).is_none());
    }

    #[test]
    fn test_shadow_only_while_airborne() {
        let level = level();
        let mut player = player_at(Vec3::new(10.0, 2.0, 5.0));
        let shadow = player.shadow_position(&level).unwrap();
        assert!((shadow.z - 1.5).abs() < 1e-4);
        player.grounded = true;
        assert!(player.shadow_position(&level).is_none());
        player.grounded = false;
        player.toggle_shadow();
        assert!(player.shadow_position(&level).is_none());
    }
}
