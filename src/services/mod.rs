pub mod image_loader;
pub mod pipeline;
pub mod surface;

pub use image_loader::{HttpFetcher, ImageLoader, SourceFetcher};
pub use pipeline::{
    ArithmeticOutput, ArithmeticRequest, Pipelines, TransformOutput, TransformRequest,
};
pub use surface::{
    CommitOutcome, Frame, RenderSurface, SurfaceEvent, SurfaceRegistry, SurfaceStatus, Ticket,
};
