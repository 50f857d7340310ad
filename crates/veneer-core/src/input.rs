use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Tertiary,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerPhase {
    Down(PointerButton),
    Up(PointerButton),
    Move,
    Enter,
    Leave,
    Cancel,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CTRL = 2;
        const ALT = 4;
        /// Cmd on macOS, Win key elsewhere.
        const META = 8;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    /// Position in the coordinate space of the receiving widget, or in
    /// display space when delivered through a capture grab.
    pub position: Vec2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, position: Vec2) -> Self {
        Self {
            phase,
            position,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(mut self, m: Modifiers) -> Self {
        self.modifiers = m;
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub is_repeat: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            is_repeat: false,
        }
    }

    pub fn with_modifiers(mut self, m: Modifiers) -> Self {
        self.modifiers = m;
        self
    }
}
