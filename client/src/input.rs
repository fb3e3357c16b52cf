//! Keyboard sampling into an explicit per-tick input state

use macroquad::prelude::*;

/// Snapshot of the movement keys for one simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl InputState {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Polls the keyboard once per frame
pub struct InputManager {
    prev_quit: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self { prev_quit: false }
    }

    /// Samples movement keys (arrows or A/D, space to jump)
    pub fn sample(&self) -> InputState {
        InputState {
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            jump: is_key_down(KeyCode::Space),
        }
    }

    /// True on the frame Escape is first pressed
    pub fn quit_requested(&mut self) -> bool {
        let quit = is_key_down(KeyCode::Escape);
        let pressed = quit && !self.prev_quit;
        self.prev_quit = quit;
        pressed
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
