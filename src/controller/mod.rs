// CONTROLLER: Input, menus, audio and the game state machine
pub mod audio;
pub mod camera_controller;
pub mod game;
pub mod input;
pub mod menu;

pub use audio::{AudioSystem, LoggingAudio};
pub use camera_controller::{CameraController, CameraMode};
pub use game::{Game, GameState};
pub use input::{InputEvent, InputProcessor, InputState};
