//! Nested papercraft shells and per-triangle texture atlas baking.

pub mod bake;
pub mod composite;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod render;
pub mod unfold;

pub use error::{PaperfoldError, Result};
