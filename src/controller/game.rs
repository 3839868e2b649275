//! Top-level game: menu flow, level progression and per-frame updates.

use std::rc::Rc;

use glam::Vec3;

use crate::config::GameConfig;
use crate::controller::audio::{AudioSystem, PlaybackId, SoundId};
use crate::controller::camera_controller::{CameraController, CameraMode};
use crate::controller::input::{InputProcessor, InputState};
use crate::controller::menu::{self, MenuElement, UiAction};
use crate::error::DefinitionError;
use crate::model::camera::Camera;
use crate::model::clock::Clock;
use crate::model::definitions::{Definitions, PlayerDefinition};
use crate::model::geometry::EulerAngles;
use crate::model::level::{Level, LevelEvent};
use crate::model::player::Player;

pub const SLOW_MOTION_SCALE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    MainMenu,
    Controls,
    Credits,
    CharacterSelect,
    LevelSelect,
    LevelPlaying,
    GameComplete,
}

pub struct Game {
    state: GameState,
    menu: Vec<MenuElement>,
    characters: Vec<Rc<PlayerDefinition>>,
    selected_character: Option<Rc<PlayerDefinition>>,
    player: Option<Player>,
    levels: Vec<Level>,
    levels_unlocked: Vec<bool>,
    current_level_index: usize,
    unlock_mode: bool,
    clock: Clock,
    pub camera: Camera,
    pub camera_controller: CameraController,
    input_processor: InputProcessor,
    audio: Box<dyn AudioSystem>,
    game_music: SoundId,
    click_sound: SoundId,
    music_playback: Option<PlaybackId>,
    music_volume: f32,
    show_debug_text: bool,
    quit_requested: bool,
}

impl Game {
    pub fn new(
        definitions: &Definitions,
        config: &GameConfig,
        mut audio: Box<dyn AudioSystem>,
        input_processor: InputProcessor,
    ) -> Result<Self, DefinitionError> {
        if definitions.players().is_empty() {
            return Err(DefinitionError::NotFound { kind: "player definition", name: "<any>".to_string() });
        }
        let levels: Vec<Level> =
            definitions.ordered_levels(&config.level_order)?.into_iter().map(Level::from_definition).collect();
        if levels.is_empty() {
            return Err(DefinitionError::NotFound { kind: "level definition", name: "<any>".to_string() });
        }
        let mut levels_unlocked = vec![false; levels.len()];
        levels_unlocked[0] = true;

        let game_music = audio.create_or_get_sound(&config.game_music);
        let click_sound = audio.create_or_get_sound(&config.button_click_sound);

        let mut game = Self {
            state: GameState::MainMenu,
            menu: Vec::new(),
            characters: definitions.players().to_vec(),
            selected_character: None,
            player: None,
            levels,
            levels_unlocked,
            current_level_index: 0,
            unlock_mode: false,
            clock: Clock::new(),
            camera: Camera::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            camera_controller: CameraController::new(),
            input_processor,
            audio,
            game_music,
            click_sound,
            music_playback: None,
            music_volume: config.music_volume,
            show_debug_text: false,
            quit_requested: false,
        };
        game.build_menu();
        tracing::info!("Game ready with {} levels", game.levels.len());
        Ok(game)
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn menu(&self) -> &[MenuElement] {
        &self.menu
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.levels.get(self.current_level_index)
    }

    pub fn current_level_index(&self) -> usize {
        self.current_level_index
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_level_unlocked(&self, index: usize) -> bool {
        self.levels_unlocked.get(index).copied().unwrap_or(false)
    }

    pub fn is_unlock_mode(&self) -> bool {
        self.unlock_mode
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn selected_character(&self) -> Option<&PlayerDefinition> {
        self.selected_character.as_deref()
    }

    /// Clock readout for the HUD, when enabled with F2
    pub fn debug_text(&self) -> Option<String> {
        self.show_debug_text.then(|| {
            format!(
                "[Game Clock] Time: {:.2}, FPS: {:.2}, TimeScale: {:.2}",
                self.clock.total_seconds(),
                self.clock.frame_rate(),
                self.clock.time_scale()
            )
        })
    }

    pub fn enter_state(&mut self, state: GameState) {
        self.exit_state(self.state);
        tracing::info!("Game state {:?} -> {:?}", self.state, state);
        self.state = state;

        if state == GameState::LevelPlaying {
            self.music_playback = Some(self.audio.start_sound(self.game_music, true, self.music_volume));
            let definition = match &self.selected_character {
                Some(def) => Rc::clone(def),
                None => Rc::clone(&self.characters[0]),
            };
            if let Some(level) = self.levels.get_mut(self.current_level_index) {
                level.reset();
            }
            self.player = Some(Player::new(definition, Vec3::ZERO, EulerAngles::ZERO));
        }
        self.build_menu();
    }

    fn exit_state(&mut self, state: GameState) {
        self.menu.clear();
        if state == GameState::LevelPlaying {
            if let Some(playback) = self.music_playback.take() {
                self.audio.stop_sound(playback);
            }
            self.player = None;
        }
    }

    fn build_menu(&mut self) {
        self.menu = match self.state {
            GameState::MainMenu => menu::main_menu(),
            GameState::Controls => menu::controls_menu(),
            GameState::Credits => menu::credits_menu(),
            GameState::CharacterSelect => {
                let names: Vec<String> = self.characters.iter().map(|c| c.name.clone()).collect();
                menu::character_select_menu(&names)
            }
            GameState::LevelSelect => menu::level_select_menu(&self.levels_unlocked, self.unlock_mode),
            GameState::GameComplete => menu::game_complete_menu(),
            GameState::LevelPlaying => Vec::new(),
        };
    }

    fn play_click(&mut self) {
        self.audio.start_sound(self.click_sound, false, self.music_volume);
    }

    /// Reacts to a clicked menu button
    pub fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::Quit => {
                self.quit_requested = true;
                return;
            }
            _ => self.play_click(),
        }
        match action {
            UiAction::Start => self.enter_state(GameState::CharacterSelect),
            UiAction::Controls => self.enter_state(GameState::Controls),
            UiAction::Credits => self.enter_state(GameState::Credits),
            UiAction::Back(state) => self.enter_state(state),
            UiAction::SelectCharacter(name) => {
                match self.characters.iter().find(|c| c.name == name) {
                    Some(def) => self.selected_character = Some(Rc::clone(def)),
                    None => tracing::warn!("Unknown character {}", name),
                }
                self.enter_state(GameState::LevelSelect);
            }
            UiAction::SelectLevel(index) => {
                if index < self.levels.len() && (self.unlock_mode || self.levels_unlocked[index]) {
                    self.current_level_index = index;
                    self.enter_state(GameState::LevelPlaying);
                }
            }
            UiAction::Quit => {}
        }
    }

    pub fn toggle_unlock_mode(&mut self) {
        self.unlock_mode = !self.unlock_mode;
        tracing::info!("Unlock mode {}", if self.unlock_mode { "on" } else { "off" });
        if self.state == GameState::LevelSelect {
            self.menu.clear();
            self.build_menu();
        }
    }

    /// Moves to the next level after the goal is reached, or finishes the game
    fn advance_to_next_level(&mut self) {
        self.current_level_index += 1;
        if self.current_level_index >= self.levels.len() {
            tracing::info!("All levels complete");
            self.enter_state(GameState::GameComplete);
            return;
        }

        if self.unlock_mode {
            self.levels_unlocked.iter_mut().for_each(|u| *u = true);
        } else {
            self.levels_unlocked[self.current_level_index] = true;
        }
        let level = &mut self.levels[self.current_level_index];
        level.reset();
        tracing::info!("Advancing to level {} ({})", self.current_level_index + 1, level.name);
        if let Some(player) = self.player.as_mut() {
            player.respawn();
        }
    }

    /// One frame: clock, simulation, key handling and camera
    pub fn update(&mut self, raw_delta_seconds: f32, input: &InputState) {
        self.adjust_for_pause_and_time_distortion(input);
        let dt = self.clock.advance(raw_delta_seconds);

        if self.state == GameState::LevelPlaying {
            self.update_gameplay(dt, input);
        }

        self.handle_key_presses(input);
        self.update_camera(dt, input);
    }

    fn adjust_for_pause_and_time_distortion(&mut self, input: &InputState) {
        let processor = &self.input_processor;
        let scale = if processor.is_slow_motion(input) { SLOW_MOTION_SCALE } else { 1.0 };
        let pause = processor.wants_to_pause(input);
        let step = processor.wants_to_step_frame(input);

        self.clock.set_time_scale(scale);
        if pause {
            self.clock.toggle_pause();
        }
        if step {
            self.clock.step_single_frame();
        }
    }

    fn update_gameplay(&mut self, dt: f32, input: &InputState) {
        let intent = self.input_processor.player_input(input);
        let Some(player) = self.player.as_mut() else { return };
        let Some(level) = self.levels.get_mut(self.current_level_index) else { return };

        player.update(dt, &intent);
        if level.update(player) == LevelEvent::GoalReached {
            self.advance_to_next_level();
        }
    }

    fn handle_key_presses(&mut self, input: &InputState) {
        let processor = self.input_processor.clone();

        if processor.wants_to_toggle_camera(input) {
            self.camera_controller.toggle_mode();
        }
        if let Some(player) = self.player.as_mut() {
            if processor.wants_to_toggle_debug_cylinder(input) {
                player.toggle_debug_draw();
            }
            if processor.wants_to_toggle_shadow(input) {
                player.toggle_shadow();
            }
        }

        match self.state {
            GameState::MainMenu => {
                if processor.is_back(input) {
                    self.quit_requested = true;
                } else if processor.is_confirm(input) {
                    self.handle_action(UiAction::Start);
                }
            }
            GameState::LevelSelect => {
                if processor.is_back(input) {
                    self.play_click();
                    self.enter_state(GameState::MainMenu);
                } else if processor.wants_to_toggle_unlock_mode(input) {
                    self.toggle_unlock_mode();
                }
            }
            GameState::LevelPlaying => {
                if processor.is_back(input) {
                    self.enter_state(GameState::MainMenu);
                    return;
                }
                if processor.wants_to_respawn(input) {
                    if let Some(player) = self.player.as_mut() {
                        player.respawn();
                    }
                }
                if processor.wants_to_toggle_debug_text(input) {
                    self.show_debug_text = !self.show_debug_text;
                }
            }
            GameState::GameComplete => {
                if processor.is_back(input) {
                    self.enter_state(GameState::MainMenu);
                }
            }
            GameState::Controls | GameState::Credits | GameState::CharacterSelect => {}
        }
    }

    fn update_camera(&mut self, dt: f32, input: &InputState) {
        match self.camera_controller.mode {
            CameraMode::FreeFly => {
                let look = input.look_delta;
                self.camera_controller.apply_look(&mut self.camera, look.x, look.y);
                let fly = self.input_processor.fly_input(input);
                self.camera_controller.update_movement(&mut self.camera, &fly, dt);
            }
            CameraMode::PlayerFollow => {
                if let Some(player) = self.player.as_ref() {
                    self.camera_controller.follow_player(&mut self.camera, player);
                }
            }
        }
    }
}

const SCREEN_WIDTH: u32 = menu::SCREEN_SIZE.x as u32;
const SCREEN_HEIGHT: u32 = menu::SCREEN_SIZE.y as u32;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::audio::Playback;
    use crate::controller::input::InputEvent;
    use crate::model::definitions::tests::{LEVELS, PLAYERS};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::Path;
    use winit::keyboard::KeyCode;

    #[derive(Default)]
    struct Recorded {
        sounds: Vec<String>,
        started: Vec<(String, bool)>,
        active: HashMap<u64, Playback>,
    }

    /// Records every request so tests can inspect them after the game owns the box
    struct RecordingAudio(Rc<RefCell<Recorded>>);

    impl AudioSystem for RecordingAudio {
        fn create_or_get_sound(&mut self, path: &str) -> SoundId {
            let mut rec = self.0.borrow_mut();
            rec.sounds.push(path.to_string());
            SoundId(rec.sounds.len() - 1)
        }

        fn start_sound(&mut self, sound: SoundId, looped: bool, volume: f32) -> PlaybackId {
            let mut rec = self.0.borrow_mut();
            let path = rec.sounds[sound.0].clone();
            rec.started.push((path, looped));
            let id = rec.started.len() as u64;
            if looped {
                rec.active.insert(id, Playback { sound, looped, volume });
            }
            PlaybackId(id)
        }

        fn stop_sound(&mut self, playback: PlaybackId) {
            self.0.borrow_mut().active.remove(&playback.0);
        }
    }

    const THREE_LEVELS: &str = r#"
        <LevelDefinitions>
            <LevelDefinition name="A">
                <SpawnInfos>
                    <SpawnInfo levelItem="Block" center="0,0,-1.5" dimensions="20,6,1"/>
                    <SpawnInfo levelItem="EndGoal" center="1,0,0" radius="1"/>
                </SpawnInfos>
            </LevelDefinition>
            <LevelDefinition name="B">
                <SpawnInfos>
                    <SpawnInfo levelItem="EndGoal" center="1,0,0" radius="1"/>
                </SpawnInfos>
            </LevelDefinition>
            <LevelDefinition name="C">
                <SpawnInfos>
                    <SpawnInfo levelItem="EndGoal" center="1,0,0" radius="1"/>
                </SpawnInfos>
            </LevelDefinition>
        </LevelDefinitions>"#;

    fn game_with(levels: &str) -> (Game, Rc<RefCell<Recorded>>) {
        let defs = Definitions::from_strings(PLAYERS, Path::new("p.xml"), levels, Path::new("l.xml")).unwrap();
        let config = GameConfig {
            game_music: "music.mp3".to_string(),
            button_click_sound: "click.mp3".to_string(),
            ..Default::default()
        };
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let audio = Box::new(RecordingAudio(Rc::clone(&recorded)));
        (Game::new(&defs, &config, audio, InputProcessor::default()).unwrap(), recorded)
    }

    fn new_game() -> (Game, Rc<RefCell<Recorded>>) {
        game_with(LEVELS)
    }

    fn press(key: KeyCode) -> InputState {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(key));
        input
    }

    fn to_level_select(game: &mut Game) {
        game.handle_action(UiAction::Start);
        game.handle_action(UiAction::SelectCharacter("Runner".to_string()));
    }

    #[test]
    fn test_starts_in_main_menu_with_first_level_unlocked() {
        let (game, _) = new_game();
        assert_eq!(game.state(), GameState::MainMenu);
        assert!(game.is_level_unlocked(0));
        assert!(!game.is_level_unlocked(1));
        assert!(game.player().is_none());
        assert!(!game.menu().is_empty());
    }

    #[test]
    fn test_menu_flow_to_level_playing() {
        let (mut game, recorded) = new_game();
        to_level_select(&mut game);
        assert_eq!(game.state(), GameState::LevelSelect);
        assert_eq!(game.selected_character().map(|c| c.name.as_str()), Some("Runner"));

        game.handle_action(UiAction::SelectLevel(0));
        assert_eq!(game.state(), GameState::LevelPlaying);
        assert!(game.menu().is_empty());
        let player = game.player().unwrap();
        assert_eq!(player.definition().name, "Runner");
        assert_eq!(player.position, Vec3::ZERO);

        let rec = recorded.borrow();
        assert_eq!(rec.active.len(), 1);
        assert_eq!(rec.started.iter().filter(|(p, _)| p == "click.mp3").count(), 3);
        assert!(rec.started.contains(&("music.mp3".to_string(), true)));
    }

    #[test]
    fn test_locked_level_cannot_be_selected() {
        let (mut game, _) = new_game();
        to_level_select(&mut game);
        game.handle_action(UiAction::SelectLevel(1));
        assert_eq!(game.state(), GameState::LevelSelect);

        game.update(0.016, &press(KeyCode::KeyK));
        assert!(game.is_unlock_mode());
        game.handle_action(UiAction::SelectLevel(1));
        assert_eq!(game.state(), GameState::LevelPlaying);
        assert_eq!(game.current_level_index(), 1);
    }

    #[test]
    fn test_escape_from_level_destroys_player_and_stops_music() {
        let (mut game, recorded) = new_game();
        to_level_select(&mut game);
        game.handle_action(UiAction::SelectLevel(0));
        game.update(0.016, &press(KeyCode::Escape));
        assert_eq!(game.state(), GameState::MainMenu);
        assert!(game.player().is_none());
        assert!(recorded.borrow().active.is_empty());
    }

    #[test]
    fn test_goal_advances_and_unlocks_next_level() {
        let (mut game, _) = game_with(THREE_LEVELS);
        to_level_select(&mut game);
        game.handle_action(UiAction::SelectLevel(0));
        // The player spawns overlapping the goal sphere
        game.update(0.016, &InputState::new());
        assert_eq!(game.state(), GameState::LevelPlaying);
        assert_eq!(game.current_level_index(), 1);
        assert!(game.is_level_unlocked(1));
        assert!(!game.is_level_unlocked(2));
        assert!(game.player().is_some());
    }

    #[test]
    fn test_goal_on_last_level_completes_game() {
        let (mut game, _) = game_with(THREE_LEVELS);
        to_level_select(&mut game);
        game.toggle_unlock_mode();
        game.handle_action(UiAction::SelectLevel(2));
        game.update(0.016, &InputState::new());
        assert_eq!(game.state(), GameState::GameComplete);
        assert!(game.player().is_none());

        game.update(0.016, &press(KeyCode::Escape));
        assert_eq!(game.state(), GameState::MainMenu);
    }

    #[test]
    fn test_main_menu_keys() {
        let (mut game, _) = new_game();
        game.update(0.016, &press(KeyCode::Space));
        assert_eq!(game.state(), GameState::CharacterSelect);

        let (mut game, _) = new_game();
        game.update(0.016, &press(KeyCode::Escape));
        assert!(game.quit_requested());

        let (mut game, _) = new_game();
        game.handle_action(UiAction::Quit);
        assert!(game.quit_requested());
    }

    #[test]
    fn test_back_buttons() {
        let (mut game, _) = new_game();
        game.handle_action(UiAction::Controls);
        assert_eq!(game.state(), GameState::Controls);
        game.handle_action(UiAction::Back(GameState::MainMenu));
        assert_eq!(game.state(), GameState::MainMenu);

        to_level_select(&mut game);
        game.handle_action(UiAction::Back(GameState::CharacterSelect));
        assert_eq!(game.state(), GameState::CharacterSelect);

        game.enter_state(GameState::LevelSelect);
        game.update(0.016, &press(KeyCode::Escape));
        assert_eq!(game.state(), GameState::MainMenu);
    }

    #[test]
    fn test_respawn_key_and_debug_toggles() {
        let (mut game, _) = new_game();
        to_level_select(&mut game);
        game.handle_action(UiAction::SelectLevel(0));
        game.player_mut().unwrap().position = Vec3::new(5.0, 0.0, 3.0);
        game.update(0.0, &press(KeyCode::KeyR));
        assert_eq!(game.player().unwrap().position.z, 0.0);

        assert!(game.debug_text().is_none());
        game.update(0.016, &press(KeyCode::F2));
        assert!(game.debug_text().unwrap().starts_with("[Game Clock]"));

        game.update(0.016, &press(KeyCode::F1));
        assert!(game.player().unwrap().draw_debug);
        game.update(0.016, &press(KeyCode::KeyL));
        assert!(!game.player().unwrap().show_shadow);
    }

    #[test]
    fn test_pause_and_slow_motion() {
        let (mut game, _) = new_game();
        game.update(0.05, &press(KeyCode::KeyP));
        assert!(game.clock().is_paused());
        assert_eq!(game.clock().delta_seconds(), 0.0);

        game.update(0.05, &press(KeyCode::KeyO));
        assert!((game.clock().delta_seconds() - 0.05).abs() < 1e-6);
        assert!(game.clock().is_paused());

        game.update(0.05, &press(KeyCode::KeyP));
        let slow = press(KeyCode::KeyT);
        game.update(0.05, &slow);
        assert!((game.clock().delta_seconds() - 0.005).abs() < 1e-6);
    }

    #[test]
    fn test_camera_follows_player_until_toggled() {
        let (mut game, _) = new_game();
        to_level_select(&mut game);
        game.handle_action(UiAction::SelectLevel(0));
        game.update(0.016, &InputState::new());
        let player_pos = game.player().unwrap().position;
        assert!((game.camera.position - (player_pos - Vec3::new(10.0, 0.0, -0.75))).length() < 1e-4);
        assert_eq!(game.camera.fov_y_degrees, 70.0);

        game.update(0.016, &press(KeyCode::F4));
        assert_eq!(game.camera_controller.mode, CameraMode::FreeFly);
        let before = game.camera.position;
        game.update(0.016, &InputState::new());
        assert_eq!(game.camera.position, before);
    }

    #[test]
    fn test_unknown_level_order_is_an_error() {
        let defs = Definitions::from_strings(PLAYERS, Path::new("p.xml"), LEVELS, Path::new("l.xml")).unwrap();
        let config = GameConfig { level_order: vec!["Nope".to_string()], ..Default::default() };
        let result = Game::new(&defs, &config, Box::new(crate::controller::audio::LoggingAudio::new()), InputProcessor::default());
        assert!(matches!(result, Err(DefinitionError::NotFound { .. })));
    }
}
