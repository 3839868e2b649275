/// Platform-agnostic input handling system
use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::model::player::PlayerInput;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(KeyCode),
    KeyUp(KeyCode),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    CursorMoved { x: f32, y: f32 },
    MouseClick { button: MouseButton, is_down: bool },

    // Window events
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keys and mouse as of the current frame.
///
/// "Just pressed" sets are cleared by [`InputState::end_frame`], so a key
/// held across frames only reports one press.
#[derive(Debug, Default)]
pub struct InputState {
    pub down_keys: HashSet<KeyCode>,
    pub just_pressed_keys: HashSet<KeyCode>,
    pub look_delta: Vec2,
    pub cursor_pos: Vec2,
    pub down_buttons: HashSet<MouseButton>,
    pub just_pressed_buttons: HashSet<MouseButton>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                // Key repeat arrives as more KeyDowns; only the first is a press
                if self.down_keys.insert(*key) {
                    self.just_pressed_keys.insert(*key);
                }
            }
            InputEvent::KeyUp(key) => {
                self.down_keys.remove(key);
            }
            InputEvent::MouseMove { dx, dy } => {
                self.look_delta += Vec2::new(*dx, *dy);
            }
            InputEvent::CursorMoved { x, y } => {
                self.cursor_pos = Vec2::new(*x, *y);
            }
            InputEvent::MouseClick { button, is_down } => {
                if *is_down {
                    if self.down_buttons.insert(*button) {
                        self.just_pressed_buttons.insert(*button);
                    }
                } else {
                    self.down_buttons.remove(button);
                }
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
        }
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.down_keys.contains(&key)
    }

    pub fn was_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    pub fn was_button_just_pressed(&self, button: MouseButton) -> bool {
        self.just_pressed_buttons.contains(&button)
    }

    pub fn clear_keys(&mut self) {
        self.down_keys.clear();
        self.just_pressed_keys.clear();
        self.down_buttons.clear();
        self.just_pressed_buttons.clear();
    }

    /// Forget this frame's presses; call once per frame after the update
    pub fn end_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_pressed_buttons.clear();
        self.look_delta = Vec2::ZERO;
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub strafe_left: KeyCode,
    pub strafe_right: KeyCode,
    pub jump: KeyCode,
    pub back: KeyCode,
    pub toggle_debug_cylinder: KeyCode,
    pub toggle_debug_text: KeyCode,
    pub toggle_camera: KeyCode,
    pub toggle_unlock_mode: KeyCode,
    pub toggle_shadow: KeyCode,
    pub respawn: KeyCode,
    pub pause: KeyCode,
    pub step_frame: KeyCode,
    pub slow_motion: KeyCode,
    pub fly_forward: KeyCode,
    pub fly_backward: KeyCode,
    pub fly_up: KeyCode,
    pub fly_down: KeyCode,
    pub fly_boost: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            strafe_left: KeyCode::KeyA,
            strafe_right: KeyCode::KeyD,
            jump: KeyCode::Space,
            back: KeyCode::Escape,
            toggle_debug_cylinder: KeyCode::F1,
            toggle_debug_text: KeyCode::F2,
            toggle_camera: KeyCode::F4,
            toggle_unlock_mode: KeyCode::KeyK,
            toggle_shadow: KeyCode::KeyL,
            respawn: KeyCode::KeyR,
            pause: KeyCode::KeyP,
            step_frame: KeyCode::KeyO,
            slow_motion: KeyCode::KeyT,
            fly_forward: KeyCode::KeyW,
            fly_backward: KeyCode::KeyS,
            fly_up: KeyCode::KeyC,
            fly_down: KeyCode::KeyZ,
            fly_boost: KeyCode::ShiftLeft,
        }
    }
}

/// Free-fly camera movement intent, each axis in -1..=1
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlyInput {
    pub forward: f32,
    pub left: f32,
    pub up: f32,
    pub boost: bool,
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        input.is_key_down(self.bindings.strafe_left) || input.is_key_down(KeyCode::ArrowLeft)
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        input.is_key_down(self.bindings.strafe_right) || input.is_key_down(KeyCode::ArrowRight)
    }

    pub fn wants_to_jump(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.jump)
    }

    pub fn player_input(&self, input: &InputState) -> PlayerInput {
        PlayerInput {
            strafe_left: self.is_moving_left(input),
            strafe_right: self.is_moving_right(input),
            jump_pressed: self.wants_to_jump(input),
        }
    }

    pub fn fly_input(&self, input: &InputState) -> FlyInput {
        FlyInput {
            forward: axis(input.is_key_down(self.bindings.fly_forward), input.is_key_down(self.bindings.fly_backward)),
            left: axis(input.is_key_down(self.bindings.strafe_left), input.is_key_down(self.bindings.strafe_right)),
            up: axis(input.is_key_down(self.bindings.fly_up), input.is_key_down(self.bindings.fly_down)),
            boost: input.is_key_down(self.bindings.fly_boost) || input.is_key_down(KeyCode::ShiftRight),
        }
    }

    pub fn is_confirm(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.jump)
    }

    pub fn is_back(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.back)
    }

    pub fn wants_to_toggle_camera(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.toggle_camera)
    }

    pub fn wants_to_toggle_debug_cylinder(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.toggle_debug_cylinder)
    }

    pub fn wants_to_toggle_debug_text(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.toggle_debug_text)
    }

    pub fn wants_to_toggle_unlock_mode(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.toggle_unlock_mode)
    }

    pub fn wants_to_toggle_shadow(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.toggle_shadow)
    }

    pub fn wants_to_respawn(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.respawn)
    }

    pub fn wants_to_pause(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.pause)
    }

    pub fn wants_to_step_frame(&self, input: &InputState) -> bool {
        input.was_key_just_pressed(self.bindings.step_frame)
    }

    pub fn is_slow_motion(&self, input: &InputState) -> bool {
        input.is_key_down(self.bindings.slow_motion)
    }
}

pub mod native {
    use super::*;
    use winit::event::{ElementState, KeyEvent};
    use winit::keyboard::PhysicalKey;

    pub fn keyboard_event_to_input(event: &KeyEvent) -> Option<InputEvent> {
        let PhysicalKey::Code(code) = event.physical_key else {
            return None;
        };
        Some(match event.state {
            ElementState::Pressed => InputEvent::KeyDown(code),
            ElementState::Released => InputEvent::KeyUp(code),
        })
    }

    pub fn mouse_button_to_input(button: winit::event::MouseButton, state: ElementState) -> Option<InputEvent> {
        let button = match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => return None,
        };
        Some(InputEvent::MouseClick { button, is_down: state == ElementState::Pressed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_lasts_one_frame() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(KeyCode::Space));
        assert!(input.was_key_just_pressed(KeyCode::Space));
        assert!(input.is_key_down(KeyCode::Space));
        input.end_frame();
        assert!(!input.was_key_just_pressed(KeyCode::Space));
        assert!(input.is_key_down(KeyCode::Space));

        // Auto-repeat does not count as a new press
        input.process_event(&InputEvent::KeyDown(KeyCode::Space));
        assert!(!input.was_key_just_pressed(KeyCode::Space));

        input.process_event(&InputEvent::KeyUp(KeyCode::Space));
        assert!(!input.is_key_down(KeyCode::Space));
    }

    #[test]
    fn test_focus_lost_releases_everything() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(KeyCode::KeyA));
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: true });
        input.process_event(&InputEvent::FocusLost);
        assert!(input.down_keys.is_empty());
        assert!(!input.was_button_just_pressed(MouseButton::Left));
    }

    #[test]
    fn test_look_delta_accumulates_until_frame_end() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseMove { dx: 3.0, dy: -1.0 });
        input.process_event(&InputEvent::MouseMove { dx: 2.0, dy: 4.0 });
        assert_eq!(input.look_delta, Vec2::new(5.0, 3.0));
        input.end_frame();
        assert_eq!(input.look_delta, Vec2::ZERO);
    }

    #[test]
    fn test_player_input_from_bindings_and_arrows() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(KeyCode::ArrowRight));
        input.process_event(&InputEvent::KeyDown(KeyCode::Space));
        let intent = processor.player_input(&input);
        assert!(intent.strafe_right);
        assert!(!intent.strafe_left);
        assert!(intent.jump_pressed);
    }

    #[test]
    fn test_fly_input_axes() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown(KeyCode::KeyW));
        input.process_event(&InputEvent::KeyDown(KeyCode::KeyD));
        input.process_event(&InputEvent::KeyDown(KeyCode::KeyC));
        input.process_event(&InputEvent::KeyDown(KeyCode::KeyZ));
        let fly = processor.fly_input(&input);
        assert_eq!(fly, FlyInput { forward: 1.0, left: -1.0, up: 0.0, boost: false });
    }
}
