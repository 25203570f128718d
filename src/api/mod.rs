pub mod surfaces;
pub mod transfer;

pub use surfaces::{
    handle_arithmetic, handle_events, handle_input_png, handle_output_png, handle_status,
    handle_transform, ArithmeticBody, SurfaceUpdateResponse, TransformBody,
};
pub use surfaces::{
    __path_handle_arithmetic, __path_handle_events, __path_handle_input_png,
    __path_handle_output_png, __path_handle_status, __path_handle_transform,
};
pub use transfer::{handle_transfer, SamplePoint, TransferResponse, __path_handle_transfer};
