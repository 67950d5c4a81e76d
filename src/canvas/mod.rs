//! The overview canvas: items, their storage, culling and layout.

mod cull;
mod grid;
mod item;
mod layout;
mod store;

pub use cull::{CullSettings, visible_items};
pub use grid::dot_grid;
pub use item::{Bitmap, CanvasItem, ItemId, ItemImage, Resolution};
pub use layout::{Arrangement, LayoutParams, auto_arrange};
pub use store::ItemStore;
