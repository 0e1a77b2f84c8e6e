//! Glyph particles that reassemble into sampled silhouettes or a grid of
//! code, pushed and pulled by a pointer and tinted by proximity.
//!
//! [`Swarm`] is the entry point. Feed it opacity masks and a code block,
//! call [`Swarm::tick`] once per frame with a [`GlyphSink`], and
//! [`Swarm::activate`] on user input.

pub mod blend;
pub mod canvas;
pub mod config;
pub mod error;
pub mod forces;
pub mod geometry;
pub mod grid;
pub mod mask;
pub mod pool;
pub mod state;
pub mod swarm;

pub use blend::Rgb;
pub use canvas::{BufferCanvas, Glyph, GlyphSink, SwarmView};
pub use config::SwarmConfig;
pub use error::SwarmError;
pub use geometry::{Point, Viewport};
pub use grid::CodeText;
pub use mask::OpacityMask;
pub use state::{Interaction, Mode};
pub use swarm::{FrameInput, FrameStats, Swarm};
