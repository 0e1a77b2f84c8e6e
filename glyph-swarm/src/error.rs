use std::fmt;

use crate::geometry::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub enum SwarmError {
    /// Viewport with a zero side.
    InvalidViewport(Viewport),
    /// Mask dimensions do not match the supplied pixel buffer.
    MalformedMask {
        width: u32,
        height: u32,
        len: usize,
    },
    /// At least one shape formation is required.
    NoShapes,
    /// The code block has no characters to tile.
    EmptyCodeText,
    /// The viewport is too small to hold a single code cell.
    EmptyCodeGrid(Viewport),
    /// A shape mask sampled to zero anchors for this viewport.
    EmptyFormation { shape: usize, viewport: Viewport },
    /// A tunable is out of range.
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwarmError::InvalidViewport(v) => write!(f, "viewport {} has a zero side", v),
            SwarmError::MalformedMask { width, height, len } => write!(
                f,
                "mask of {}x{} pixels cannot be read from a buffer of {} bytes",
                width, height, len
            ),
            SwarmError::NoShapes => write!(f, "at least one shape mask is required"),
            SwarmError::EmptyCodeText => write!(f, "code block contains no characters"),
            SwarmError::EmptyCodeGrid(v) => {
                write!(f, "viewport {} is too small to hold a code cell", v)
            }
            SwarmError::EmptyFormation { shape, viewport } => write!(
                f,
                "shape {} produced no anchors at viewport {} (fully transparent mask?)",
                shape, viewport
            ),
            SwarmError::InvalidConfig { field, reason } => {
                write!(f, "invalid configuration `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for SwarmError {}
