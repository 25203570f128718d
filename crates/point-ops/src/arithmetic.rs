//! Two-image arithmetic: saturated addition and clipped subtraction.

use crate::error::PointOpError;
use crate::raster::{RasterImage, CHANNELS, OPAQUE};

/// Pixel-wise combination of two equally sized rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `min(a + b, 255)` per channel
    Add,
    /// `max(a - b, 0)` per channel
    Subtract,
}

impl ArithmeticOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
        }
    }

    /// Combine two channel values with integer saturating arithmetic.
    #[inline]
    pub fn apply_channel(&self, a: u8, b: u8) -> u8 {
        match self {
            ArithmeticOp::Add => a.saturating_add(b),
            ArithmeticOp::Subtract => a.saturating_sub(b),
        }
    }
}

/// Combine `left` and `right` channel by channel into a new opaque raster.
///
/// Input alpha is ignored. Both rasters must have the same dimensions.
pub fn combine(
    left: &RasterImage,
    right: &RasterImage,
    op: ArithmeticOp,
) -> Result<RasterImage, PointOpError> {
    if left.dimensions() != right.dimensions() {
        return Err(PointOpError::DimensionMismatch {
            left: left.dimensions(),
            right: right.dimensions(),
        });
    }

    let mut out = Vec::with_capacity(left.as_bytes().len());
    for (a, b) in left.pixels().zip(right.pixels()) {
        for c in 0..3 {
            out.push(op.apply_channel(a[c], b[c]));
        }
        out.push(OPAQUE);
    }
    debug_assert_eq!(out.len(), left.pixel_count() * CHANNELS);

    Ok(RasterImage::from_parts(left.width(), left.height(), out))
}
