pub mod config;
pub mod operator;
pub mod source;

pub use config::{
    AppConfig, ArithmeticConfig, DefaultImages, FetchConfig, GammaRange, RenderingConfig,
    SurfaceConfig, TransformConfig,
};
pub use operator::{OperatorError, OperatorSelection};
pub use source::{DataUrl, ImageSource};
