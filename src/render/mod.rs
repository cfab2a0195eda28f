//! Renderer-facing geometry and contracts
//!
//! The engine never talks to a graphics API. It produces:
//! - per-pass vertex arrays under a hard vertex ceiling ([`TileBatcher`])
//! - a [`RenderCommand`] with the matrices and fade uniforms per draw
//! - depth culling and perspective scale for sprite-like entities
//!
//! The host renderer owns buffers, shaders and submission.

mod batch;
mod command;
mod sprite;
mod visibility;

pub use batch::*;
pub use command::*;
pub use sprite::*;
pub use visibility::*;
