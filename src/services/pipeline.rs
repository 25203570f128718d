use point_ops::{combine, ArithmeticOp, PointOp, RasterImage};
use std::sync::Arc;

use crate::error::PipelineError;
use crate::models::{AppConfig, ImageSource};
use crate::services::image_loader::{self, ImageLoader};

/// Single-image transform inputs, captured at trigger time
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub source: ImageSource,
    pub op: PointOp,
}

/// Result of the single-image pipeline
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Resampled input
    pub original: RasterImage,
    /// Operator applied to `original`, same dimensions
    pub transformed: RasterImage,
}

/// Two-image arithmetic inputs, captured at trigger time
#[derive(Debug, Clone)]
pub struct ArithmeticRequest {
    pub first: ImageSource,
    pub second: ImageSource,
    pub op: ArithmeticOp,
}

/// Result of the two-image pipeline
#[derive(Debug, Clone)]
pub struct ArithmeticOutput {
    pub first: RasterImage,
    pub second: RasterImage,
    pub combined: RasterImage,
}

/// Runs the single-image and arithmetic pipelines
pub struct Pipelines {
    loader: ImageLoader,
    config: Arc<AppConfig>,
}

impl Pipelines {
    pub fn new(loader: ImageLoader, config: Arc<AppConfig>) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load one image, resample it and apply a point operator.
    ///
    /// The operator is validated before any I/O. Decoding, resampling and
    /// the per-pixel pass run on the blocking pool.
    pub async fn run_transform(
        &self,
        request: TransformRequest,
    ) -> Result<TransformOutput, PipelineError> {
        let TransformRequest { source, op } = request;
        op.validate().map_err(PipelineError::InvalidParameter)?;

        if let PointOp::Gamma(gamma) = op {
            if !self.config.gamma.contains(gamma) {
                tracing::debug!(
                    gamma,
                    min = self.config.gamma.min,
                    max = self.config.gamma.max,
                    "Gamma outside the advertised range"
                );
            }
        }

        tracing::info!(
            operator = op.name(),
            source = %source.describe(),
            "Running transform pipeline"
        );

        let resolution = self.config.transform_resolution();
        let bytes = self.loader.read_bytes(&source).await?;

        let output = tokio::task::spawn_blocking(move || {
            let original = image_loader::decode(&bytes, resolution)?;
            let transformed = op.apply(&original).map_err(PipelineError::InvalidParameter)?;
            Ok::<_, PipelineError>(TransformOutput {
                original,
                transformed,
            })
        })
        .await
        .map_err(|e| PipelineError::Task(format!("transform task failed: {e}")))??;

        tracing::info!(
            operator = op.name(),
            width = output.transformed.width(),
            height = output.transformed.height(),
            "Transform pipeline finished"
        );

        Ok(output)
    }

    /// Load two images concurrently at the fixed arithmetic resolution and
    /// combine them channel by channel.
    ///
    /// Both loads must succeed; the first failure aborts the invocation.
    pub async fn run_arithmetic(
        &self,
        request: ArithmeticRequest,
    ) -> Result<ArithmeticOutput, PipelineError> {
        let ArithmeticRequest { first, second, op } = request;
        let resolution = self.config.arithmetic_resolution();

        tracing::info!(
            operator = op.name(),
            first = %first.describe(),
            second = %second.describe(),
            "Running arithmetic pipeline"
        );

        let (first, second) = tokio::try_join!(
            self.loader.load(&first, resolution),
            self.loader.load(&second, resolution),
        )?;

        let output = tokio::task::spawn_blocking(move || {
            let combined = combine(&first, &second, op).map_err(PipelineError::InvalidParameter)?;
            Ok::<_, PipelineError>(ArithmeticOutput {
                first,
                second,
                combined,
            })
        })
        .await
        .map_err(|e| PipelineError::Task(format!("arithmetic task failed: {e}")))??;

        tracing::info!(
            operator = op.name(),
            width = output.combined.width(),
            height = output.combined.height(),
            "Arithmetic pipeline finished"
        );

        Ok(output)
    }
}
