//! Transfer function sampling for chart display.
//!
//! A [`TransferCurve`] describes the scalar mapping a point operator applies
//! to every channel, as a lazy sequence of `(u, v)` samples. It reads no
//! pixel data; gamma samples come from [`gamma_value`], the same function
//! [`GammaTable`](crate::point::GammaTable) is built from, so the curve and
//! the processed pixels agree at every sampled input.

use crate::error::PointOpError;
use crate::point::{gamma_value, invert_value, validate_gamma};

/// One point of a transfer curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSample {
    /// Input channel value
    pub u: u8,
    /// Output channel value
    pub v: u8,
}

/// Scalar function drawn by the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferFunction {
    Inversion,
    Gamma(f64),
}

impl TransferFunction {
    /// Build a gamma function, rejecting non-positive or non-finite values.
    pub fn gamma(gamma: f64) -> Result<Self, PointOpError> {
        Ok(TransferFunction::Gamma(validate_gamma(gamma)?))
    }

    /// Evaluate the function at `u`.
    #[inline]
    pub fn eval(&self, u: u8) -> u8 {
        match *self {
            TransferFunction::Inversion => invert_value(u),
            TransferFunction::Gamma(gamma) => gamma_value(u, gamma),
        }
    }

    /// Whether the curve brightens, darkens or leaves mid-tones unchanged.
    pub fn tone(&self) -> CurveTone {
        match *self {
            TransferFunction::Gamma(gamma) if gamma < 1.0 => CurveTone::Lighten,
            TransferFunction::Gamma(gamma) if gamma > 1.0 => CurveTone::Darken,
            _ => CurveTone::Neutral,
        }
    }
}

/// Visual classification of a curve, used to colour the chart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveTone {
    Lighten,
    Darken,
    Neutral,
}

/// Sampling density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleDensity {
    /// Step 5, for the primary chart
    #[default]
    Fine,
    /// Step 15, for compact charts
    Coarse,
    /// Custom step (must be at least 1)
    Step(u8),
}

impl SampleDensity {
    pub const FINE_STEP: u8 = 5;
    pub const COARSE_STEP: u8 = 15;

    pub fn step(&self) -> u8 {
        match *self {
            SampleDensity::Fine => Self::FINE_STEP,
            SampleDensity::Coarse => Self::COARSE_STEP,
            SampleDensity::Step(step) => step,
        }
    }
}

/// A finite, restartable sequence of transfer samples.
///
/// Samples start at `u = 0`, advance by the density's step and always end at
/// `u = 255` (appended when the step does not land on it).
///
/// ```
/// use point_ops::{SampleDensity, TransferCurve, TransferFunction};
///
/// let curve = TransferCurve::new(TransferFunction::Inversion, SampleDensity::Coarse).unwrap();
/// let samples: Vec<_> = curve.iter().collect();
/// assert_eq!(samples.len(), 18);
/// assert_eq!((samples[0].u, samples[0].v), (0, 255));
/// assert_eq!((samples[17].u, samples[17].v), (255, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferCurve {
    function: TransferFunction,
    step: u8,
}

impl TransferCurve {
    pub fn new(function: TransferFunction, density: SampleDensity) -> Result<Self, PointOpError> {
        if let TransferFunction::Gamma(gamma) = function {
            validate_gamma(gamma)?;
        }
        let step = density.step();
        if step == 0 {
            return Err(PointOpError::InvalidStep(step));
        }
        Ok(Self { function, step })
    }

    pub fn function(&self) -> TransferFunction {
        self.function
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    /// Start a fresh pass over the samples.
    pub fn iter(&self) -> TransferSamples {
        TransferSamples {
            function: self.function,
            step: self.step as u16,
            next: Some(0),
        }
    }
}

impl IntoIterator for TransferCurve {
    type Item = TransferSample;
    type IntoIter = TransferSamples;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &TransferCurve {
    type Item = TransferSample;
    type IntoIter = TransferSamples;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the samples of a [`TransferCurve`].
#[derive(Debug, Clone)]
pub struct TransferSamples {
    function: TransferFunction,
    step: u16,
    next: Option<u16>,
}

impl Iterator for TransferSamples {
    type Item = TransferSample;

    fn next(&mut self) -> Option<Self::Item> {
        let u = self.next?;
        self.next = match u {
            255 => None,
            _ => Some((u + self.step).min(255)),
        };
        let u = u as u8;
        Some(TransferSample {
            u,
            v: self.function.eval(u),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            None => 0,
            // Samples at u, u+step, ... strictly below 255, plus 255 itself.
            Some(u) => (255 - u).div_ceil(self.step) as usize + 1,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TransferSamples {}
