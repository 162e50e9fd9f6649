use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::state::{KeyboardState, MouseMode, MouseState};

/// Source of per-frame input samples.
///
/// The desktop host implements this over window events; tests and the CLI use
/// [`ScriptedInput`].
pub trait InputSampler {
    /// Called once at the start of every update, before any state is read.
    fn begin_frame(&mut self) {}

    fn keyboard_state(&self) -> KeyboardState;

    fn mouse_state(&self) -> MouseState;

    fn set_mouse_mode(&mut self, mode: MouseMode);
}

/// One scripted frame of input. Mouse `dx`/`dy` only show up as deltas while
/// the sampler is in relative mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub keyboard: KeyboardState,
    pub dx: i32,
    pub dy: i32,
    pub right_button: bool,
}

/// Replays a fixed sequence of frames, then reports idle input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    pending: VecDeque<InputFrame>,
    current: InputFrame,
    mode: MouseMode,
    mode_changes: Vec<MouseMode>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            pending: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn mode(&self) -> MouseMode {
        self.mode
    }

    /// Every mode transition requested so far, in order.
    pub fn mode_changes(&self) -> &[MouseMode] {
        &self.mode_changes
    }
}

impl InputSampler for ScriptedInput {
    fn begin_frame(&mut self) {
        self.current = self.pending.pop_front().unwrap_or_default();
    }

    fn keyboard_state(&self) -> KeyboardState {
        self.current.keyboard
    }

    fn mouse_state(&self) -> MouseState {
        MouseState {
            x: self.current.dx,
            y: self.current.dy,
            mode: self.mode,
            right_button: self.current.right_button,
        }
    }

    fn set_mouse_mode(&mut self, mode: MouseMode) {
        if mode != self.mode {
            tracing::trace!(?mode, "scripted mouse mode changed");
            self.mode_changes.push(mode);
        }
        self.mode = mode;
    }
}
