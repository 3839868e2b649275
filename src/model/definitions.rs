//! Player and level definitions loaded from `Data/Definitions/*.xml`.

use std::path::Path;
use std::rc::Rc;

use glam::{IVec2, Vec2, Vec3};
use roxmltree::{Document, Node};

use crate::error::DefinitionError;
use crate::model::animation::AnimationGroup;
use crate::model::geometry::{EulerAngles, Rgba8};
use crate::model::xml::{child_elements, children_named, first_child, parse_attribute};

pub const PLAYER_DEFINITIONS_FILE: &str = "Definitions/PlayerDefinitions.xml";
pub const LEVEL_DEFINITIONS_FILE: &str = "Definitions/LevelDefinitions.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillboardType {
    #[default]
    None,
    WorldUpFacing,
    WorldUpOpposing,
    FullOpposing,
}

impl BillboardType {
    fn from_name(name: &str) -> Self {
        match name {
            "WorldUpFacing" => BillboardType::WorldUpFacing,
            "WorldUpOpposing" => BillboardType::WorldUpOpposing,
            "FullOpposing" => BillboardType::FullOpposing,
            _ => BillboardType::None,
        }
    }
}

/// Only the built-in shaders exist; any other name is reported and ignored
fn warn_on_custom_shader(owner: &str, shader: &str) -> bool {
    if shader == "Default" {
        return false;
    }
    tracing::warn!("{}: shader \"{}\" is not available, using the built-in one", owner, shader);
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerDefinition {
    pub name: String,
    pub visible: bool,
    pub physics_radius: f32,
    pub physics_height: f32,
    pub collides_with_blocks: bool,
    pub simulated: bool,
    pub move_speed: f32,
    pub strafe_speed: f32,
    pub jump_force: f32,
    pub camera_fov: f32,
    pub sprite_size: Vec2,
    pub sprite_pivot: Vec2,
    pub billboard: BillboardType,
    pub render_lit: bool,
    pub render_rounded: bool,
    pub sprite_sheet: Option<String>,
    pub cell_count: IVec2,
    pub animation_groups: Vec<AnimationGroup>,
}

impl Default for PlayerDefinition {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            visible: false,
            physics_radius: 0.0,
            physics_height: 0.0,
            collides_with_blocks: false,
            simulated: false,
            move_speed: 0.0,
            strafe_speed: 0.0,
            jump_force: 0.0,
            camera_fov: 0.0,
            sprite_size: Vec2::ONE,
            sprite_pivot: Vec2::splat(0.5),
            billboard: BillboardType::None,
            render_lit: false,
            render_rounded: false,
            sprite_sheet: None,
            cell_count: IVec2::ONE,
            animation_groups: Vec::new(),
        }
    }
}

impl PlayerDefinition {
    pub fn from_xml(element: Node) -> Result<Self, DefinitionError> {
        let mut def = PlayerDefinition::default();
        def.name = parse_attribute(element, "name", def.name)?;
        def.visible = parse_attribute(element, "visible", def.visible)?;

        if let Some(collision) = first_child(element, "Collision") {
            def.physics_radius = parse_attribute(collision, "physicsRadius", def.physics_radius)?;
            def.physics_height = parse_attribute(collision, "physicsHeight", def.physics_height)?;
            def.collides_with_blocks = parse_attribute(collision, "collidesWithBlock", def.collides_with_blocks)?;
        }

        if let Some(physics) = first_child(element, "Physics") {
            def.simulated = parse_attribute(physics, "simulated", def.simulated)?;
            def.move_speed = parse_attribute(physics, "moveSpeed", def.move_speed)?;
            def.strafe_speed = parse_attribute(physics, "strafeSpeed", def.strafe_speed)?;
            def.jump_force = parse_attribute(physics, "jumpForce", def.jump_force)?;
        }

        if let Some(camera) = first_child(element, "Camera") {
            def.camera_fov = parse_attribute(camera, "cameraFOV", def.camera_fov)?;
        }

        if let Some(visuals) = first_child(element, "Visuals") {
            def.sprite_size = parse_attribute(visuals, "spriteSize", def.sprite_size)?;
            def.sprite_pivot = parse_attribute(visuals, "spritePivot", def.sprite_pivot)?;
            def.billboard = BillboardType::from_name(&parse_attribute(visuals, "billboardType", String::new())?);
            def.render_lit = parse_attribute(visuals, "renderLit", def.render_lit)?;
            def.render_rounded = parse_attribute(visuals, "renderRounded", def.render_rounded)?;
            warn_on_custom_shader(&def.name, &parse_attribute(visuals, "shader", "Default".to_string())?);
            let sheet: String = parse_attribute(visuals, "spriteSheet", String::new())?;
            def.sprite_sheet = (!sheet.is_empty()).then_some(sheet);
            def.cell_count = parse_attribute(visuals, "cellCount", def.cell_count)?;
            def.animation_groups = children_named(visuals, "AnimationGroup")
                .map(AnimationGroup::from_xml)
                .collect::<Result<_, _>>()?;
        }

        Ok(def)
    }

    /// Index and group named `name`
    pub fn animation_group(&self, name: &str) -> Option<(usize, &AnimationGroup)> {
        self.animation_groups.iter().enumerate().find(|(_, g)| g.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelItem {
    Block,
    EndGoal,
    Other(String),
}

impl LevelItem {
    fn from_name(name: &str) -> Self {
        match name {
            "Block" => LevelItem::Block,
            "EndGoal" => LevelItem::EndGoal,
            other => LevelItem::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnInfo {
    pub item: LevelItem,
    pub center: Vec3,
    pub dimensions: Vec3,
    pub orientation: EulerAngles,
    pub radius: f32,
    pub color: Rgba8,
}

impl SpawnInfo {
    pub fn from_xml(element: Node) -> Result<Self, DefinitionError> {
        let item: String = parse_attribute(element, "levelItem", "default".to_string())?;
        Ok(Self {
            item: LevelItem::from_name(&item),
            center: parse_attribute(element, "center", Vec3::ZERO)?,
            dimensions: parse_attribute(element, "dimensions", Vec3::ZERO)?,
            orientation: parse_attribute(element, "orientation", EulerAngles::ZERO)?,
            radius: parse_attribute(element, "radius", 0.0)?,
            color: parse_attribute(element, "color", Rgba8::WHITE)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelDefinition {
    pub name: String,
    pub spawn_infos: Vec<SpawnInfo>,
}

impl LevelDefinition {
    pub fn from_xml(element: Node) -> Result<Self, DefinitionError> {
        let name = parse_attribute(element, "name", "default".to_string())?;
        warn_on_custom_shader(&name, &parse_attribute(element, "shader", "Default".to_string())?);
        let spawn_infos = match first_child(element, "SpawnInfos") {
            Some(infos) => children_named(infos, "SpawnInfo")
                .map(SpawnInfo::from_xml)
                .collect::<Result<_, _>>()?,
            None => Vec::new(),
        };
        Ok(Self { name, spawn_infos })
    }
}

/// Every definition loaded at startup; immutable afterwards
#[derive(Debug, Default)]
pub struct Definitions {
    players: Vec<Rc<PlayerDefinition>>,
    levels: Vec<LevelDefinition>,
}

fn read_file(path: &Path) -> Result<String, DefinitionError> {
    std::fs::read_to_string(path).map_err(|source| DefinitionError::Io { path: path.to_path_buf(), source })
}

/// Parses `text` and runs `parse` on each root child, which must all be `<expected>`
fn parse_root_children<T>(
    text: &str,
    path: &Path,
    expected: &'static str,
    parse: impl Fn(Node) -> Result<T, DefinitionError>,
) -> Result<Vec<T>, DefinitionError> {
    let doc = Document::parse(text).map_err(|source| DefinitionError::Xml { path: path.to_path_buf(), source })?;
    child_elements(doc.root_element())
        .map(|child| {
            let found = child.tag_name().name();
            if found != expected {
                return Err(DefinitionError::UnexpectedElement {
                    path: path.to_path_buf(),
                    expected,
                    found: found.to_string(),
                });
            }
            parse(child)
        })
        .collect()
}

impl Definitions {
    /// Loads both definition files below `data_dir`
    pub fn load(data_dir: &Path) -> Result<Self, DefinitionError> {
        let player_path = data_dir.join(PLAYER_DEFINITIONS_FILE);
        let level_path = data_dir.join(LEVEL_DEFINITIONS_FILE);
        let defs = Self::from_strings(&read_file(&player_path)?, &player_path, &read_file(&level_path)?, &level_path)?;
        tracing::info!(
            "Loaded {} player definitions and {} level definitions from {}",
            defs.players.len(),
            defs.levels.len(),
            data_dir.display()
        );
        Ok(defs)
    }

    pub fn from_strings(
        players_xml: &str,
        players_path: &Path,
        levels_xml: &str,
        levels_path: &Path,
    ) -> Result<Self, DefinitionError> {
        let players = parse_root_children(players_xml, players_path, "PlayerDefinition", PlayerDefinition::from_xml)?
            .into_iter()
            .map(Rc::new)
            .collect();
        let levels = parse_root_children(levels_xml, levels_path, "LevelDefinition", LevelDefinition::from_xml)?;
        Ok(Self { players, levels })
    }

    pub fn players(&self) -> &[Rc<PlayerDefinition>] {
        &self.players
    }

    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    pub fn player(&self, name: &str) -> Option<&Rc<PlayerDefinition>> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn level(&self, name: &str) -> Option<&LevelDefinition> {
        self.levels.iter().find(|l| l.name == name)
    }

    pub fn require_level(&self, name: &str) -> Result<&LevelDefinition, DefinitionError> {
        self.level(name).ok_or_else(|| DefinitionError::NotFound { kind: "level definition", name: name.to_string() })
    }

    /// Levels in play order: `order` by name when given, file order otherwise
    pub fn ordered_levels(&self, order: &[String]) -> Result<Vec<&LevelDefinition>, DefinitionError> {
        if order.is_empty() {
            return Ok(self.levels.iter().collect());
        }
        order.iter().map(|name| self.require_level(name)).collect()
    }
}
