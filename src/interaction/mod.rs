//! Pointer, wheel and keyboard handling for the overview canvas.

mod controller;
mod event;
mod handles;
mod selection;

pub use controller::{
    Gesture, InteractionContext, InteractionController, InteractionSettings, PressTarget,
    ResizeGesture,
};
pub use event::{InputEvent, Key, Modifiers, PointerButton};
pub use handles::{Corner, hit_handle};
pub use selection::{Placement, SelectionState};
