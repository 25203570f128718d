//! Error type for raster construction and operator validation.

use std::fmt;

/// Error type for the point-ops public API.
#[derive(Debug, Clone, PartialEq)]
pub enum PointOpError {
    /// Gamma exponent is not a finite value greater than zero
    InvalidGamma(f64),
    /// Transfer sampling step is zero
    InvalidStep(u8),
    /// Width or height is zero
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Pixel buffer length does not match `width * height * 4`
    BufferLength {
        /// Expected buffer length in bytes
        expected: usize,
        /// Actual buffer length in bytes
        actual: usize,
    },
    /// Two rasters that must be combined have different sizes
    DimensionMismatch {
        /// Size of the left operand
        left: (u32, u32),
        /// Size of the right operand
        right: (u32, u32),
    },
}

impl fmt::Display for PointOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointOpError::InvalidGamma(gamma) => {
                write!(f, "gamma must be a finite value greater than 0 (got {})", gamma)
            }
            PointOpError::InvalidStep(step) => {
                write!(f, "sampling step must be at least 1 (got {})", step)
            }
            PointOpError::InvalidDimensions { width, height } => {
                write!(f, "invalid raster dimensions: {}x{}", width, height)
            }
            PointOpError::BufferLength { expected, actual } => {
                write!(
                    f,
                    "pixel buffer length mismatch: expected {} bytes, got {}",
                    expected, actual
                )
            }
            PointOpError::DimensionMismatch { left, right } => {
                write!(
                    f,
                    "raster size mismatch: {}x{} vs {}x{}",
                    left.0, left.1, right.0, right.1
                )
            }
        }
    }
}

impl std::error::Error for PointOpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_gamma() {
        let err = PointOpError::InvalidGamma(0.0);
        assert_eq!(
            err.to_string(),
            "gamma must be a finite value greater than 0 (got 0)"
        );
    }

    #[test]
    fn test_display_dimension_mismatch() {
        let err = PointOpError::DimensionMismatch {
            left: (400, 300),
            right: (200, 100),
        };
        assert_eq!(err.to_string(), "raster size mismatch: 400x300 vs 200x100");
    }

    #[test]
    fn test_display_buffer_length() {
        let err = PointOpError::BufferLength {
            expected: 16,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "pixel buffer length mismatch: expected 16 bytes, got 12"
        );
    }
}
