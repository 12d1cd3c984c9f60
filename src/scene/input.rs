//! Input Events
//!
//! The platform layer turns window/keyboard/mouse state into a FIFO of
//! [`InputEvent`]s. The scene drains the whole queue once per frame,
//! before the update pass.

use std::collections::VecDeque;

/// Keys the engine and demo care about; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    /// Letters and digits, uppercase
    Char(char),
    /// Platform key code with no mapping here
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(Key),
    KeyReleased(Key),
    MouseMoved { x: f32, y: f32 },
    MouseButtonPressed { button: MouseButton, x: f32, y: f32 },
    MouseButtonReleased { button: MouseButton, x: f32, y: f32 },
    Resized { width: f32, height: f32 },
    /// Window close button or OS quit request
    CloseRequested,
}

/// A FIFO of pending input events.
pub trait InputSource {
    /// Next pending event, oldest first.
    fn poll_event(&mut self) -> Option<InputEvent>;
}

/// In-memory queue, handy for tests and replay.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl InputSource for InputQueue {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }
}

impl Extend<InputEvent> for InputQueue {
    fn extend<I: IntoIterator<Item = InputEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}
