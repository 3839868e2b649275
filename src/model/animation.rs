//! Sprite-sheet animation: per-direction frame ranges grouped under a name.

use glam::{IVec2, Vec2, Vec3};
use roxmltree::Node;

use crate::error::DefinitionError;
use crate::model::xml::{children_named, first_child, parse_attribute};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    Loop,
    #[default]
    Once,
    PingPong,
}

impl PlaybackMode {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Loop" => Some(PlaybackMode::Loop),
            "Once" => Some(PlaybackMode::Once),
            "PingPong" => Some(PlaybackMode::PingPong),
            _ => None,
        }
    }
}

/// Frames `start_frame..=end_frame` of a sprite sheet played at a fixed rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteAnimDefinition {
    pub start_frame: i32,
    pub end_frame: i32,
    pub seconds_per_frame: f32,
    pub mode: PlaybackMode,
}

impl SpriteAnimDefinition {
    pub fn frame_count(&self) -> i32 {
        (self.end_frame - self.start_frame + 1).max(1)
    }

    pub fn duration(&self) -> f32 {
        let count = self.frame_count();
        match self.mode {
            PlaybackMode::PingPong => (2 * count - 2).max(1) as f32 * self.seconds_per_frame,
            _ => count as f32 * self.seconds_per_frame,
        }
    }

    /// Sprite sheet cell shown `seconds` after the animation started
    pub fn frame_at(&self, seconds: f32) -> i32 {
        if self.seconds_per_frame <= 0.0 {
            return self.start_frame;
        }
        let count = self.frame_count();
        let step = (seconds.max(0.0) / self.seconds_per_frame).floor() as i32;
        let offset = match self.mode {
            PlaybackMode::Loop => step.rem_euclid(count),
            PlaybackMode::Once => step.min(count - 1),
            PlaybackMode::PingPong => {
                if count == 1 {
                    0
                } else {
                    let cycle = 2 * count - 2;
                    let k = step.rem_euclid(cycle);
                    if k < count { k } else { cycle - k }
                }
            }
        };
        self.start_frame + offset
    }
}

/// UV rectangle `(min, max)` of `frame` on a sheet laid out in `cell_count`
/// columns and rows, first cell at the top left.
pub fn sprite_uvs(cell_count: IVec2, frame: i32) -> (Vec2, Vec2) {
    let cols = cell_count.x.max(1);
    let rows = cell_count.y.max(1);
    let frame = frame.rem_euclid(cols * rows);
    let cell = Vec2::new(1.0 / cols as f32, 1.0 / rows as f32);
    let min = Vec2::new((frame % cols) as f32, (frame / cols) as f32) * cell;
    (min, min + cell)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationGroup {
    pub name: String,
    pub seconds_per_frame: f32,
    pub mode: PlaybackMode,
    pub scale_by_speed: bool,
    directions: Vec<Vec3>,
    anims: Vec<SpriteAnimDefinition>,
}

impl AnimationGroup {
    pub fn from_xml(element: Node) -> Result<Self, DefinitionError> {
        let name: String = parse_attribute(element, "name", String::new())?;
        let seconds_per_frame = parse_attribute(element, "secondsPerFrame", 0.0f32)?;
        let mode_name: String = parse_attribute(element, "playbackMode", String::new())?;
        let mode = PlaybackMode::from_name(&mode_name).unwrap_or_default();
        let scale_by_speed = parse_attribute(element, "scaleBySpeed", false)?;

        let mut directions = Vec::new();
        let mut anims = Vec::new();
        for direction_element in children_named(element, "Direction") {
            let direction = parse_attribute(direction_element, "vector", Vec3::ZERO)?.normalize_or_zero();
            let anim_element = first_child(direction_element, "Animation")
                .ok_or_else(|| DefinitionError::MissingAnimation { group: name.clone() })?;
            anims.push(SpriteAnimDefinition {
                start_frame: parse_attribute(anim_element, "startFrame", -1)?,
                end_frame: parse_attribute(anim_element, "endFrame", -1)?,
                seconds_per_frame: parse_attribute(anim_element, "secondsPerFrame", seconds_per_frame)?,
                mode,
            });
            directions.push(direction);
        }

        Ok(Self { name, seconds_per_frame, mode, scale_by_speed, directions, anims })
    }

    /// Animation whose stored direction best matches `direction`
    pub fn anim_for_direction(&self, direction: Vec3) -> Option<&SpriteAnimDefinition> {
        let mut best: Option<(f32, usize)> = None;
        for (i, stored) in self.directions.iter().enumerate() {
            let dot = direction.dot(*stored);
            if best.map_or(true, |(max, _)| dot > max) {
                best = Some((dot, i));
            }
        }
        best.map(|(_, i)| &self.anims[i])
    }

    /// Length of one playback, taken from the first direction
    pub fn duration(&self) -> f32 {
        self.anims.first().map_or(0.0, |a| a.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anim(start: i32, end: i32, mode: PlaybackMode) -> SpriteAnimDefinition {
        SpriteAnimDefinition { start_frame: start, end_frame: end, seconds_per_frame: 0.1, mode }
    }

    #[test]
    fn test_frame_selection_per_mode() {
        let looped = anim(4, 7, PlaybackMode::Loop);
        assert_eq!(looped.frame_at(0.0), 4);
        assert_eq!(looped.frame_at(0.25), 6);
        assert_eq!(looped.frame_at(0.45), 4);

        let once = anim(4, 7, PlaybackMode::Once);
        assert_eq!(once.frame_at(10.0), 7);

        let ping = anim(0, 3, PlaybackMode::PingPong);
        let frames: Vec<i32> = (0..8).map(|i| ping.frame_at(i as f32 * 0.1 + 0.05)).collect();
        assert_eq!(frames, vec![0, 1, 2, 3, 2, 1, 0, 1]);
    }

    #[test]
    fn test_durations() {
        assert!((anim(0, 3, PlaybackMode::Once).duration() - 0.4).abs() < 1e-6);
        assert!((anim(0, 3, PlaybackMode::PingPong).duration() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_sprite_uvs_walk_rows() {
        let (min, max) = sprite_uvs(IVec2::new(4, 2), 5);
        assert_eq!(min, Vec2::new(0.25, 0.5));
        assert_eq!(max, Vec2::new(0.5, 1.0));
    }

    #[test]
    fn test_group_parses_directions_and_picks_best_match() {
        let xml = r#"
            <AnimationGroup name="Walk" secondsPerFrame="0.2" playbackMode="Loop" scaleBySpeed="true">
                <Direction vector="1,0,0"><Animation startFrame="0" endFrame="3"/></Direction>
                <Direction vector="0,2,0"><Animation startFrame="4" endFrame="7"/></Direction>
                <Direction vector="-1,0,0"><Animation startFrame="8" endFrame="11"/></Direction>
            </AnimationGroup>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let group = AnimationGroup::from_xml(doc.root_element()).unwrap();
        assert_eq!(group.name, "Walk");
        assert_eq!(group.mode, PlaybackMode::Loop);
        assert!(group.scale_by_speed);
        assert_eq!(group.anim_for_direction(Vec3::new(0.1, 0.9, 0.0)).unwrap().start_frame, 4);
        assert_eq!(group.anim_for_direction(Vec3::NEG_X).unwrap().start_frame, 8);
        // Equidistant from +X and +Y: the first stored direction wins
        let diagonal = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_eq!(group.anim_for_direction(diagonal).unwrap().start_frame, 0);
        assert!((group.duration() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_direction_without_animation_is_an_error() {
        let xml = r#"<AnimationGroup name="Jump"><Direction vector="1,0,0"/></AnimationGroup>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        match AnimationGroup::from_xml(doc.root_element()) {
            Err(DefinitionError::MissingAnimation { group }) => assert_eq!(group, "Jump"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_playback_mode_defaults_to_once() {
        let xml = r#"<AnimationGroup name="Idle" playbackMode="Bounce"/>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let group = AnimationGroup::from_xml(doc.root_element()).unwrap();
        assert_eq!(group.mode, PlaybackMode::Once);
        assert!(group.anims.is_empty());
        assert!(group.anim_for_direction(Vec3::X).is_none());
    }
}
