use serde::{Deserialize, Serialize};

/// Keys the demo reacts to. Hosts map their platform key codes onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Walk forward.
    W,
    /// Walk backward.
    S,
    /// Strafe left.
    A,
    /// Strafe right.
    D,
    /// Fly up.
    Q,
    /// Fly down.
    E,
    /// Request exit.
    Escape,
}

impl Key {
    pub const ALL: [Key; 7] = [Key::W, Key::S, Key::A, Key::D, Key::Q, Key::E, Key::Escape];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Snapshot of which keys are held this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    held: u8,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: Key) -> Self {
        self.set(key, true);
        self
    }

    pub fn set(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.held |= key.bit();
        } else {
            self.held &= !key.bit();
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.held & key.bit() != 0
    }

    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        Key::ALL.into_iter().filter(|k| self.is_pressed(*k))
    }
}

/// How the mouse reports its `x`/`y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseMode {
    /// Cursor position in window pixels.
    #[default]
    Absolute,
    /// Motion since the previous sample; cursor hidden and captured.
    Relative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseState {
    pub x: i32,
    pub y: i32,
    pub mode: MouseMode,
    pub right_button: bool,
}

impl MouseState {
    /// Motion since the previous sample, zero unless in relative mode.
    pub fn delta(&self) -> (i32, i32) {
        match self.mode {
            MouseMode::Relative => (self.x, self.y),
            MouseMode::Absolute => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_toggle_independently() {
        let mut kb = KeyboardState::new().with(Key::W).with(Key::Q);
        assert!(kb.is_pressed(Key::W));
        assert!(kb.is_pressed(Key::Q));
        assert!(!kb.is_pressed(Key::S));

        kb.set(Key::W, false);
        assert!(!kb.is_pressed(Key::W));
        assert_eq!(kb.pressed().collect::<Vec<_>>(), vec![Key::Q]);
    }

    #[test]
    fn absolute_mouse_has_no_delta() {
        let m = MouseState {
            x: 400,
            y: 300,
            mode: MouseMode::Absolute,
            right_button: true,
        };
        assert_eq!(m.delta(), (0, 0));

        let m = MouseState {
            mode: MouseMode::Relative,
            ..m
        };
        assert_eq!(m.delta(), (400, 300));
    }
}
