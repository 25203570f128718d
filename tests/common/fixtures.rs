//! Test fixtures: encoded images and request bodies.

use base64::Engine;
use serde_json::{json, Value};
use std::io::Cursor;

/// Encode a solid-colour image in the given format
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3], format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)
        .expect("Failed to encode fixture image");
    buf.into_inner()
}

/// Solid-colour PNG
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    solid_image(width, height, rgb, image::ImageFormat::Png)
}

/// Horizontal grey ramp PNG: pixel x has value `x * 255 / (width - 1)`
pub fn ramp_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / (width - 1)) as u8;
        image::Rgb([v, v, v])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode fixture image");
    buf.into_inner()
}

/// Pseudo-random RGB PNG; barely compresses, so its size tracks `width * height * 3`
pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        let mut channel = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        image::Rgb([channel(), channel(), channel()])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode fixture image");
    buf.into_inner()
}

/// `data:` URL for PNG bytes
pub fn png_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Image source object for a solid-colour inline PNG
pub fn solid_source(width: u32, height: u32, rgb: [u8; 3]) -> Value {
    json!({ "data_url": png_data_url(&solid_png(width, height, rgb)) })
}

/// Transform request body
pub fn transform_body(source: Value, operator: Value) -> Value {
    json!({ "source": source, "operator": operator })
}

/// Arithmetic request body
pub fn arithmetic_body(first: Value, second: Value, op: &str) -> Value {
    json!({ "first": first, "second": second, "operator": { "op": op } })
}
