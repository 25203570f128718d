//! Single-image point operators: identity, inversion and gamma.
//!
//! A point operator maps every colour channel through a scalar function that
//! depends only on that channel's value. Alpha is never read and every output
//! pixel is opaque.

use crate::error::PointOpError;
use crate::raster::{RasterImage, CHANNELS, OPAQUE};

/// Validate a gamma exponent: it must be finite and strictly positive.
pub fn validate_gamma(gamma: f64) -> Result<f64, PointOpError> {
    if gamma.is_finite() && gamma > 0.0 {
        Ok(gamma)
    } else {
        Err(PointOpError::InvalidGamma(gamma))
    }
}

/// Scalar gamma mapping: `round(255 * (u / 255)^gamma)`, clamped to `0..=255`.
///
/// This is the single definition shared by [`GammaTable`] and the transfer
/// curve sampler. `f64::round` rounds half away from zero, which equals
/// round-half-up on this non-negative domain.
#[inline]
pub fn gamma_value(u: u8, gamma: f64) -> u8 {
    let normalized = u as f64 / 255.0;
    let v = (255.0 * normalized.powf(gamma)).round();
    // NaN (never produced for a validated gamma) also lands on 0 here.
    v.clamp(0.0, 255.0) as u8
}

/// Inverted channel value.
#[inline]
pub fn invert_value(u: u8) -> u8 {
    255 - u
}

/// Precomputed 256-entry gamma lookup table.
///
/// Built once per invocation so the per-pixel loop never calls `powf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable {
    table: [u8; 256],
}

impl GammaTable {
    /// Build the table for `gamma`.
    pub fn new(gamma: f64) -> Result<Self, PointOpError> {
        let gamma = validate_gamma(gamma)?;
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = gamma_value(i as u8, gamma);
        }
        Ok(Self { table })
    }

    #[inline]
    pub fn get(&self, u: u8) -> u8 {
        self.table[u as usize]
    }

    /// The raw table, indexed by input channel value.
    pub fn as_array(&self) -> &[u8; 256] {
        &self.table
    }
}

/// Point operator applied by the single-image pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointOp {
    /// Output equals input.
    Identity,
    /// Each colour channel becomes `255 - c`.
    Inversion,
    /// Power-law remapping of the normalised channel value.
    Gamma(f64),
}

impl PointOp {
    /// Build a gamma operator, rejecting non-positive or non-finite values.
    pub fn gamma(gamma: f64) -> Result<Self, PointOpError> {
        Ok(PointOp::Gamma(validate_gamma(gamma)?))
    }

    /// Short lowercase name, used in logs and API responses.
    pub fn name(&self) -> &'static str {
        match self {
            PointOp::Identity => "identity",
            PointOp::Inversion => "inversion",
            PointOp::Gamma(_) => "gamma",
        }
    }

    /// Check the operator's parameter.
    pub fn validate(&self) -> Result<(), PointOpError> {
        if let PointOp::Gamma(gamma) = *self {
            validate_gamma(gamma)?;
        }
        Ok(())
    }

    /// Apply the operator, allocating a new opaque raster of the same size.
    ///
    /// The identity operator returns a pixel-exact copy (alpha normalised to
    /// 255, which loaded rasters already are).
    pub fn apply(&self, image: &RasterImage) -> Result<RasterImage, PointOpError> {
        let table: [u8; 256] = match *self {
            PointOp::Identity => return Ok(image.clone().force_opaque()),
            PointOp::Inversion => std::array::from_fn(|i| invert_value(i as u8)),
            PointOp::Gamma(gamma) => *GammaTable::new(gamma)?.as_array(),
        };
        Ok(map_channels(image, &table))
    }
}

/// Map R, G and B of every pixel through `table`; alpha is set to 255.
pub fn map_channels(image: &RasterImage, table: &[u8; 256]) -> RasterImage {
    let mut out = Vec::with_capacity(image.as_bytes().len());
    for px in image.as_bytes().chunks_exact(CHANNELS) {
        out.push(table[px[0] as usize]);
        out.push(table[px[1] as usize]);
        out.push(table[px[2] as usize]);
        out.push(OPAQUE);
    }
    RasterImage::from_parts(image.width(), image.height(), out)
}
