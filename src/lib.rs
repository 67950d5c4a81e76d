//! Hajimi - image review overview
//!
//! The infinite-canvas core of an image review tool: every image of a
//! folder laid out on a pannable, zoomable canvas, with asynchronous
//! thumbnail loading, culling, selection and group transforms. The crate is
//! independent of any UI toolkit; hosts feed it [`interaction::InputEvent`]s
//! and render what [`overview::Overview`] reports.

pub mod canvas;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod geometry;
pub mod interaction;
pub mod overview;
pub mod pipeline;
pub mod project;
pub mod results;

pub use config::OverviewConfig;
pub use error::{DecodeError, OverviewError};
pub use overview::Overview;
