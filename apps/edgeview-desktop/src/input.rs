use std::sync::Arc;

use edgeview_input::{InputSampler, Key, KeyboardState, MouseMode, MouseState};
use winit::keyboard::KeyCode;
use winit::window::{CursorGrabMode, Window};

pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::KeyE => Some(Key::E),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

/// Input sampler fed from winit window and device events.
///
/// Raw mouse motion accumulates between updates and is handed out once per
/// `begin_frame`.
#[derive(Default)]
pub struct WinitInput {
    window: Option<Arc<Window>>,
    keyboard: KeyboardState,
    cursor: (i32, i32),
    pending_motion: (f64, f64),
    frame_motion: (i32, i32),
    right_button: bool,
    mode: MouseMode,
}

impl WinitInput {
    pub fn attach(&mut self, window: Arc<Window>) {
        self.window = Some(window);
    }

    pub fn on_key(&mut self, code: KeyCode, pressed: bool) {
        if let Some(key) = map_key(code) {
            self.keyboard.set(key, pressed);
        }
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = (x as i32, y as i32);
    }

    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.mode == MouseMode::Relative {
            self.pending_motion.0 += dx;
            self.pending_motion.1 += dy;
        }
    }

    pub fn on_right_button(&mut self, pressed: bool) {
        self.right_button = pressed;
    }

    /// Forget held keys and buttons, e.g. when focus is lost mid-press.
    pub fn clear(&mut self) {
        self.keyboard = KeyboardState::default();
        self.right_button = false;
        self.pending_motion = (0.0, 0.0);
    }
}

impl InputSampler for WinitInput {
    fn begin_frame(&mut self) {
        let (dx, dy) = std::mem::take(&mut self.pending_motion);
        self.frame_motion = (dx.round() as i32, dy.round() as i32);
    }

    fn keyboard_state(&self) -> KeyboardState {
        self.keyboard
    }

    fn mouse_state(&self) -> MouseState {
        let (x, y) = match self.mode {
            MouseMode::Relative => self.frame_motion,
            MouseMode::Absolute => self.cursor,
        };
        MouseState {
            x,
            y,
            mode: self.mode,
            right_button: self.right_button,
        }
    }

    fn set_mouse_mode(&mut self, mode: MouseMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.pending_motion = (0.0, 0.0);

        let Some(window) = &self.window else {
            return;
        };
        let grab = match mode {
            MouseMode::Relative => window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined)),
            MouseMode::Absolute => window.set_cursor_grab(CursorGrabMode::None),
        };
        if let Err(e) = grab {
            tracing::warn!("cursor grab failed: {e}");
        }
        window.set_cursor_visible(mode == MouseMode::Absolute);
        tracing::debug!(?mode, "mouse mode changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_demo_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::KeyW), Some(Key::W));
        assert_eq!(map_key(KeyCode::Escape), Some(Key::Escape));
        assert_eq!(map_key(KeyCode::Space), None);
    }

    #[test]
    fn motion_is_delivered_once_per_frame_in_relative_mode() {
        let mut input = WinitInput::default();
        input.on_mouse_motion(5.0, 5.0);
        input.begin_frame();
        assert_eq!(input.mouse_state().delta(), (0, 0));

        input.set_mouse_mode(MouseMode::Relative);
        input.on_mouse_motion(3.0, -1.0);
        input.on_mouse_motion(1.6, -1.0);
        input.begin_frame();
        assert_eq!(input.mouse_state().delta(), (5, -2));

        input.begin_frame();
        assert_eq!(input.mouse_state().delta(), (0, 0));
    }

    #[test]
    fn keys_follow_press_and_release() {
        let mut input = WinitInput::default();
        input.on_key(KeyCode::KeyQ, true);
        assert!(input.keyboard_state().is_pressed(Key::Q));
        input.on_key(KeyCode::KeyQ, false);
        assert!(!input.keyboard_state().is_pressed(Key::Q));

        input.on_key(KeyCode::KeyA, true);
        input.on_right_button(true);
        input.clear();
        assert_eq!(input.keyboard_state(), KeyboardState::default());
        assert!(!input.mouse_state().right_button);
    }
}
