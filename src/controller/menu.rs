//! Menu screens as plain data.
//!
//! Layout uses a 1600x800 virtual screen with the origin at the bottom
//! left; the UI layer scales it to the window.

use glam::Vec2;

use crate::controller::game::GameState;
use crate::model::geometry::Rgba8;

pub const SCREEN_SIZE: Vec2 = Vec2::new(1600.0, 800.0);

pub const SEAWEED: Rgba8 = Rgba8::new(46, 139, 87, 255);
pub const SEAWEED_HOVER: Rgba8 = Rgba8::new(20, 60, 20, 120);
pub const DARK_RED: Rgba8 = Rgba8::new(139, 0, 0, 255);
pub const DARK_RED_HOVER: Rgba8 = Rgba8::new(139, 0, 0, 120);
pub const SAPPHIRE: Rgba8 = Rgba8::new(15, 82, 186, 255);
pub const SAPPHIRE_HOVER: Rgba8 = Rgba8::new(50, 80, 150, 120);
pub const DARK_GRAY: Rgba8 = Rgba8::new(64, 64, 64, 255);
pub const LIME_GREEN: Rgba8 = Rgba8::new(50, 205, 50, 255);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub mins: Vec2,
    pub maxs: Vec2,
}

impl ScreenRect {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { mins: Vec2::new(min_x, min_y), maxs: Vec2::new(max_x, max_y) }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.mins).all() && point.cmple(self.maxs).all()
    }
}

pub const START_BOUNDS: ScreenRect = ScreenRect::new(600.0, 400.0, 1000.0, 460.0);
pub const EXIT_BOUNDS: ScreenRect = ScreenRect::new(600.0, 300.0, 1000.0, 360.0);
pub const CORNER_BUTTON_BOUNDS: ScreenRect = ScreenRect::new(200.0, 100.0, 400.0, 160.0);
pub const CREDITS_BOUNDS: ScreenRect = ScreenRect::new(1200.0, 100.0, 1400.0, 160.0);
pub const LEVEL_BACK_BOUNDS: ScreenRect = ScreenRect::new(600.0, 60.0, 1000.0, 120.0);

/// What a button does when clicked
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Start,
    Quit,
    Controls,
    Credits,
    Back(GameState),
    SelectCharacter(String),
    SelectLevel(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderStyle {
    Solid,
    Dashed { dash: f32, gap: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuElement {
    Button {
        id: String,
        bounds: ScreenRect,
        label: String,
        color: Rgba8,
        hover_color: Rgba8,
        /// `None` for a disabled button
        action: Option<UiAction>,
    },
    Border {
        id: String,
        bounds: ScreenRect,
        color: Rgba8,
        thickness: f32,
        style: BorderStyle,
    },
    /// Text centered at `alignment` (0..1 of the screen on each axis)
    Text {
        text: String,
        alignment: Vec2,
        size: f32,
        color: Rgba8,
    },
}

fn button(id: &str, bounds: ScreenRect, label: &str, color: Rgba8, hover_color: Rgba8, action: UiAction) -> MenuElement {
    MenuElement::Button {
        id: id.to_string(),
        bounds,
        label: label.to_string(),
        color,
        hover_color,
        action: Some(action),
    }
}

fn border(id: &str, bounds: ScreenRect, thickness: f32) -> MenuElement {
    MenuElement::Border { id: id.to_string(), bounds, color: Rgba8::BLACK, thickness, style: BorderStyle::Solid }
}

fn text(text: &str, y: f32, size: f32) -> MenuElement {
    MenuElement::Text { text: text.to_string(), alignment: Vec2::new(0.5, y), size, color: LIME_GREEN }
}

fn back_button(to: GameState) -> [MenuElement; 2] {
    [
        button("BackButton", CORNER_BUTTON_BOUNDS, "Back", DARK_RED, DARK_RED_HOVER, UiAction::Back(to)),
        border("BackButtonBorder", CORNER_BUTTON_BOUNDS, 5.5),
    ]
}

pub fn main_menu() -> Vec<MenuElement> {
    vec![
        text("Runner", 0.7, 70.0),
        button("StartButton", START_BOUNDS, "Start", SEAWEED, SEAWEED_HOVER, UiAction::Start),
        border("StartButtonBorder", START_BOUNDS, 2.5),
        button("ExitButton", EXIT_BOUNDS, "Exit", DARK_RED, DARK_RED_HOVER, UiAction::Quit),
        border("ExitButtonBorder", EXIT_BOUNDS, 2.5),
        button("ControlsButton", CORNER_BUTTON_BOUNDS, "Controls", SEAWEED, SEAWEED_HOVER, UiAction::Controls),
        border("ControlsButtonBorder", CORNER_BUTTON_BOUNDS, 2.5),
        button("CreditsButton", CREDITS_BOUNDS, "Credits", SEAWEED, SEAWEED_HOVER, UiAction::Credits),
        border("CreditsBorder", CREDITS_BOUNDS, 2.0),
    ]
}

pub fn controls_menu() -> Vec<MenuElement> {
    let mut elements = vec![
        text("Controls", 0.85, 50.0),
        text("Move Left:   [A]", 0.7, 25.0),
        text("Jump:    [SPACE]", 0.6, 25.0),
        text("Move Right:  [D]", 0.5, 25.0),
        text("Pause:       [P]", 0.4, 25.0),
        text("Reset:       [R]", 0.3, 25.0),
        MenuElement::Border {
            id: "ControlsBorder".to_string(),
            bounds: ScreenRect::new(500.0, 150.0, 1100.0, 650.0),
            color: LIME_GREEN,
            thickness: 2.0,
            style: BorderStyle::Dashed { dash: 10.0, gap: 7.0 },
        },
    ];
    elements.extend(back_button(GameState::MainMenu));
    elements
}

pub fn credits_menu() -> Vec<MenuElement> {
    let mut elements = vec![
        text("Credits", 0.85, 50.0),
        text("Runner: a small 3D platformer", 0.7, 25.0),
        text("Inspired by the Run series of browser games", 0.6, 25.0),
        text("Rendered with wgpu, menus by egui", 0.5, 25.0),
    ];
    elements.extend(back_button(GameState::MainMenu));
    elements
}

/// One button per character, stacked from the top
pub fn character_select_menu(characters: &[String]) -> Vec<MenuElement> {
    let mut elements = vec![text("Character Select", 0.7, 70.0)];
    for (i, name) in characters.iter().enumerate() {
        let top = START_BOUNDS.maxs.y - 100.0 * i as f32;
        let bounds = ScreenRect::new(START_BOUNDS.mins.x, top - 60.0, START_BOUNDS.maxs.x, top);
        elements.push(button(
            &format!("{}Button", name),
            bounds,
            name,
            SAPPHIRE,
            SAPPHIRE_HOVER,
            UiAction::SelectCharacter(name.clone()),
        ));
    }
    elements.extend(back_button(GameState::MainMenu));
    elements
}

/// Numbered level buttons; locked levels are greyed out and do nothing
pub fn level_select_menu(unlocked: &[bool], unlock_mode: bool) -> Vec<MenuElement> {
    let mut elements = vec![text("Level Select", 0.85, 70.0)];
    for (i, &is_unlocked) in unlocked.iter().enumerate() {
        let top = 520.0 - 80.0 * i as f32;
        let bounds = ScreenRect::new(600.0, top - 60.0, 1000.0, top);
        let enabled = unlock_mode || is_unlocked;
        elements.push(MenuElement::Button {
            id: format!("Level{}Button", i + 1),
            bounds,
            label: (i + 1).to_string(),
            color: if enabled { SAPPHIRE } else { DARK_GRAY },
            hover_color: if enabled { SAPPHIRE_HOVER } else { DARK_GRAY },
            action: enabled.then_some(UiAction::SelectLevel(i)),
        });
    }
    elements.push(button(
        "BackButton",
        LEVEL_BACK_BOUNDS,
        "Back",
        DARK_RED,
        DARK_RED_HOVER,
        UiAction::Back(GameState::CharacterSelect),
    ));
    elements
}

pub fn game_complete_menu() -> Vec<MenuElement> {
    vec![
        text("CONGRATULATIONS!", 0.7, 50.0),
        text("Press ESC to return to the Main Menu", 0.5, 25.0),
        text("Thanks for playing!", 0.3, 25.0),
    ]
}
