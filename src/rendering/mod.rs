pub mod encoder;

pub use encoder::{encode_png, encode_png_in_blocking_context};
