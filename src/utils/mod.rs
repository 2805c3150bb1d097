//! Utility modules shared by the build and the renderer.

pub mod minify;
pub mod slug;
