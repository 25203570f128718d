//! RGBA raster buffer.
//!
//! [`RasterImage`] is the unit of exchange between every stage of the
//! pipeline: the image loader produces one, the operators read one and allocate
//! a new one, and the caller hands the final one to whatever displays it.

use crate::error::PointOpError;

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Fully opaque alpha value.
pub const OPAQUE: u8 = 255;

/// A rectangular grid of RGBA pixels stored as a flat, channel-interleaved
/// buffer in row-major order.
///
/// Width and height are always at least 1 and the buffer is always exactly
/// `width * height * 4` bytes long.
///
/// # Example
///
/// ```
/// use point_ops::RasterImage;
///
/// let image = RasterImage::filled(2, 2, [128, 128, 128]).unwrap();
/// assert_eq!(image.width(), 2);
/// assert_eq!(image.pixel(1, 1), [128, 128, 128, 255]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap an existing RGBA buffer.
    ///
    /// Alpha values are kept as given; use [`force_opaque`](Self::force_opaque)
    /// to normalise them.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PointOpError> {
        let expected = buffer_len(width, height)?;
        if data.len() != expected {
            return Err(PointOpError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create an opaque raster where every pixel has the given colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, PointOpError> {
        let len = buffer_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / CHANNELS {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], OPAQUE]);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a raster from a buffer the crate itself produced.
    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * CHANNELS,
            "buffer length must match {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` tuple.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the raster and return its RGBA bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Iterate over pixels as `[r, g, b, a]` chunks in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }

    /// Whether every pixel has alpha 255.
    pub fn is_opaque(&self) -> bool {
        self.pixels().all(|px| px[3] == OPAQUE)
    }

    /// Return a copy with every alpha value set to 255.
    pub fn force_opaque(mut self) -> Self {
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px[3] = OPAQUE;
        }
        self
    }

    /// Packed RGB bytes (alpha dropped), for encoders that do not need alpha.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.pixels() {
            out.extend_from_slice(&px[..3]);
        }
        out
    }
}

/// Validate dimensions and return the RGBA buffer length.
pub(crate) fn buffer_len(width: u32, height: u32) -> Result<usize, PointOpError> {
    if width == 0 || height == 0 {
        return Err(PointOpError::InvalidDimensions { width, height });
    }
    Ok(width as usize * height as usize * CHANNELS)
}
