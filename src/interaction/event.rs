//! Toolkit-independent input events.
//!
//! Hosts translate their windowing system's events into [`InputEvent`]s and
//! feed them to the overview. Positions are screen-space pixels relative to
//! the canvas viewport's top-left corner.

use crate::geometry::Vec2;

/// Input events the overview responds to.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer button pressed.
    PointerDown {
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// Pointer moved (with or without a button held).
    PointerMove { position: Vec2 },
    /// Pointer button released.
    PointerUp {
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    /// Wheel scrolled; positive `delta` zooms in, one unit per notch.
    /// With Ctrl held it scales the selected items instead.
    Wheel {
        delta: f32,
        position: Vec2,
        modifiers: Modifiers,
    },
    /// Trackpad pinch; `factor` multiplies the current zoom.
    Pinch { factor: f32, position: Vec2 },
    /// Second click of a double click.
    DoubleClick { position: Vec2, button: PointerButton },
    /// Keyboard key pressed.
    KeyDown { key: Key, modifiers: Modifiers },
    /// Keyboard key released.
    KeyUp { key: Key, modifiers: Modifiers },
    /// The host lost the pointer (focus change, capture lost).
    Cancel,
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keyboard keys the overview cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Escape,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Shift, Ctrl or Cmd: add to the selection instead of replacing it.
    pub fn extends_selection(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}
