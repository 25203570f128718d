//! point-ops: point-wise image operations for teaching
//!
//! This library implements the per-pixel operators of an introductory image
//! processing course on plain RGBA buffers:
//!
//! - Negative ([`PointOp::Inversion`]): `v = 255 - u`
//! - Gamma correction ([`PointOp::Gamma`]): `v = round(255 * (u/255)^γ)`
//! - Saturated addition ([`ArithmeticOp::Add`]): `min(a + b, 255)`
//! - Clipped subtraction ([`ArithmeticOp::Subtract`]): `max(a - b, 0)`
//!
//! Gamma operates on raw channel values, not on linear light. It is the
//! textbook power law, not a colour-managed conversion.
//!
//! # Quick Start
//!
//! ```
//! use point_ops::{PointOp, RasterImage};
//!
//! let image = RasterImage::filled(4, 4, [128, 128, 128]).unwrap();
//! let negative = PointOp::Inversion.apply(&image).unwrap();
//! assert_eq!(negative.pixel(0, 0), [127, 127, 127, 255]);
//!
//! let darker = PointOp::gamma(2.0).unwrap().apply(&image).unwrap();
//! assert_eq!(darker.pixel(0, 0), [64, 64, 64, 255]);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! decoded RGBA (any size)
//!     |
//!     v
//! resample to working resolution   (FitWidth or Exact, alpha -> 255)
//!     |
//!     +---> PointOp::apply          (one image, 256-entry LUT)
//!     |
//!     +---> arithmetic::combine     (two images of equal size)
//!     |
//!     v
//! new RasterImage                  (inputs are never modified)
//! ```
//!
//! [`TransferCurve`] produces the `(u, v)` points of the operator's scalar
//! mapping for charts, from the same function the lookup table uses.

pub mod arithmetic;
pub mod error;
pub mod point;
pub mod raster;
pub mod resample;
pub mod transfer;


pub use arithmetic::{combine, ArithmeticOp};
pub use error::PointOpError;
pub use point::{GammaTable, PointOp};
pub use raster::RasterImage;
pub use resample::{fit_width, WorkingResolution};
pub use transfer::{CurveTone, SampleDensity, TransferCurve, TransferFunction, TransferSample};
