//! PNG encoding of processed rasters.
//!
//! Rasters leaving the pipelines are always opaque, so they are written as
//! 8-bit RGB without an alpha channel.

use point_ops::RasterImage;
use std::io::Cursor;

use crate::error::RenderError;

/// Encode a raster as an RGB8 PNG, optionally re-compressed with oxipng
pub fn encode_png(image: &RasterImage, optimize: bool) -> Result<Vec<u8>, RenderError> {
    let rgb = image.to_rgb_bytes();
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(&rgb)
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    let png_bytes = buf.into_inner();

    if !optimize {
        return Ok(png_bytes);
    }

    // Keep the fast encoding if oxipng gives up
    let optimized = oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            ..Default::default()
        },
    )
    .unwrap_or(png_bytes);
    Ok(optimized)
}

/// [`encode_png`] on the blocking pool
pub async fn encode_png_in_blocking_context(
    image: RasterImage,
    optimize: bool,
) -> Result<Vec<u8>, RenderError> {
    tokio::task::spawn_blocking(move || encode_png(&image, optimize))
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn decode(bytes: &[u8]) -> (png::OutputInfo, Vec<u8>) {
        let mut decoder = png::Decoder::new(bytes);
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info, buf)
    }

    #[test]
    fn test_encode_rgb8() {
        let image = RasterImage::filled(3, 2, [10, 20, 30]).unwrap();
        let bytes = encode_png(&image, false).unwrap();

        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        let (info, data) = decode(&bytes);
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        assert_eq!(info.bit_depth, png::BitDepth::Eight);
        assert_eq!(&data[..3], &[10, 20, 30]);
        assert_eq!(data.len(), 3 * 2 * 3);
    }

    #[test]
    fn test_optimized_output_decodes_to_same_pixels() {
        let mut data = Vec::new();
        for i in 0..64u32 {
            data.extend_from_slice(&[(i * 4) as u8, 0, 255 - (i * 4) as u8, 255]);
        }
        let image = RasterImage::from_rgba(8, 8, data).unwrap();

        let (_, plain) = decode(&encode_png(&image, false).unwrap());
        let (_, optimized) = decode(&encode_png(&image, true).unwrap());
        assert_eq!(plain, image.to_rgb_bytes());
        assert_eq!(optimized, plain);
    }

    #[tokio::test]
    async fn test_encode_in_blocking_context() {
        let image = RasterImage::filled(1, 1, [0, 0, 0]).unwrap();
        let bytes = encode_png_in_blocking_context(image, false).await.unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
    }
}
