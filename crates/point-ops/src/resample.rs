//! Working-resolution selection.
//!
//! Every image is normalised to a working resolution before any operator
//! touches it. The single-image pipeline caps the width and keeps the aspect
//! ratio ([`WorkingResolution::FitWidth`]); the arithmetic pipeline forces
//! both operands to one fixed size ([`WorkingResolution::Exact`]) so they can
//! be combined pixel for pixel.
//!
//! This module only picks the target size. Filtering happens where the image
//! is decoded.

use crate::error::PointOpError;
use crate::raster::buffer_len;

/// Target size policy for a pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingResolution {
    /// Cap the width at `max_width`, preserve aspect ratio, round height down.
    FitWidth { max_width: u32 },
    /// Stretch to exactly `width` x `height`, ignoring aspect ratio.
    Exact { width: u32, height: u32 },
}

impl WorkingResolution {
    /// Resolve the concrete target size for a source of the given size.
    pub fn resolve(&self, src_width: u32, src_height: u32) -> Result<(u32, u32), PointOpError> {
        match *self {
            WorkingResolution::FitWidth { max_width } => {
                fit_width(src_width, src_height, max_width)
            }
            WorkingResolution::Exact { width, height } => {
                buffer_len(width, height)?;
                Ok((width, height))
            }
        }
    }
}

/// Compute the aspect-preserving size for a source capped at `max_width`.
///
/// Sources narrower than the cap keep their size. Wider sources get exactly
/// `max_width` and a height of `floor(src_height * max_width / src_width)`,
/// never less than 1.
///
/// ```
/// use point_ops::resample::fit_width;
///
/// assert_eq!(fit_width(1000, 750, 500).unwrap(), (500, 375));
/// assert_eq!(fit_width(1000, 333, 500).unwrap(), (500, 166));
/// assert_eq!(fit_width(320, 240, 500).unwrap(), (320, 240));
/// ```
pub fn fit_width(
    src_width: u32,
    src_height: u32,
    max_width: u32,
) -> Result<(u32, u32), PointOpError> {
    buffer_len(src_width, src_height)?;
    if max_width == 0 {
        return Err(PointOpError::InvalidDimensions {
            width: max_width,
            height: src_height,
        });
    }
    if src_width <= max_width {
        return Ok((src_width, src_height));
    }
    // Integer arithmetic so the division floors exactly.
    let height = (src_height as u64 * max_width as u64 / src_width as u64).max(1) as u32;
    Ok((max_width, height))
}
