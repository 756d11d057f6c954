//! Input state
//!
//! The platform layer pushes [`InputEvent`]s into an [`InputState`]; the scene
//! manager hands a shared reference to every event and input hook of the frame.

use std::collections::BTreeSet;

/// Snapshot of held keys, pointer position and this frame's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    held_keys: BTreeSet<KeyCode>,
    held_buttons: BTreeSet<MouseButton>,
    pointer: (f64, f64),
    events: Vec<InputEvent>,
}

static EMPTY: InputState = InputState::new();

impl InputState {
    /// Create an empty input state
    pub const fn new() -> Self {
        Self {
            held_keys: BTreeSet::new(),
            held_buttons: BTreeSet::new(),
            pointer: (0.0, 0.0),
            events: Vec::new(),
        }
    }

    /// Shared empty state, used for hooks that run outside a frame
    pub fn empty() -> &'static Self {
        &EMPTY
    }

    /// Record an event and update held state
    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => {
                self.held_keys.insert(key);
            }
            InputEvent::KeyReleased(key) => {
                self.held_keys.remove(&key);
            }
            InputEvent::MouseButtonPressed(button) => {
                self.held_buttons.insert(button);
            }
            InputEvent::MouseButtonReleased(button) => {
                self.held_buttons.remove(&button);
            }
            InputEvent::MouseMoved { x, y } => self.pointer = (x, y),
            InputEvent::Quit => {}
        }
        self.events.push(event);
    }

    /// Drop the events of the finished frame; held state carries over
    pub fn begin_frame(&mut self) {
        self.events.clear();
    }

    /// Events received since the last [`Self::begin_frame`]
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Whether `key` is currently held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    /// Whether `key` went down during this frame
    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.events.contains(&InputEvent::KeyPressed(key))
    }

    /// Whether `button` is currently held
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.held_buttons.contains(&button)
    }

    /// Last known pointer position in window pixels
    pub const fn pointer(&self) -> (f64, f64) {
        self.pointer
    }

    /// Whether a quit request arrived this frame
    pub fn quit_requested(&self) -> bool {
        self.events.contains(&InputEvent::Quit)
    }
}

/// Raw input event from the platform layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key went down
    KeyPressed(KeyCode),
    /// Key went up
    KeyReleased(KeyCode),
    /// Mouse button went down
    MouseButtonPressed(MouseButton),
    /// Mouse button went up
    MouseButtonReleased(MouseButton),
    /// Pointer moved
    MouseMoved {
        /// Window x in pixels
        x: f64,
        /// Window y in pixels
        y: f64,
    },
    /// Window close or quit request
    Quit,
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// Q key
    Q,
    /// S key
    S,
    /// W key
    W,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Backquote, opens the debug console
    Backquote,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}
