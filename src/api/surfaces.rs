use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{ImageSource, OperatorSelection};
use crate::rendering::encode_png_in_blocking_context;
use crate::server::AppState;
use crate::services::surface::is_valid_surface_id;
use crate::services::{
    ArithmeticRequest, CommitOutcome, RenderSurface, SurfaceStatus, TransformRequest,
};

/// Single-image transform request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransformBody {
    /// Input image; the operator's default image when omitted
    #[serde(default)]
    pub source: Option<ImageSource>,
    /// `identity`, `inversion` or `gamma`
    pub operator: OperatorSelection,
}

/// Two-image arithmetic request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ArithmeticBody {
    /// First operand (I1); default image when omitted
    #[serde(default)]
    pub first: Option<ImageSource>,
    /// Second operand (I2); default image when omitted
    #[serde(default)]
    pub second: Option<ImageSource>,
    /// `add` or `subtract`
    pub operator: OperatorSelection,
}

/// Result of a pipeline invocation on a surface
#[derive(Debug, Serialize, ToSchema)]
pub struct SurfaceUpdateResponse {
    pub surface: String,
    /// Ticket issued for this invocation
    pub sequence: u64,
    /// `superseded` when a newer invocation was triggered meanwhile
    pub outcome: CommitOutcome,
    pub width: u32,
    pub height: u32,
    /// Latest output of the surface
    pub output_url: String,
    /// Resampled inputs of the latest frame
    pub input_urls: Vec<String>,
}

impl SurfaceUpdateResponse {
    fn new(
        surface: &str,
        sequence: u64,
        outcome: CommitOutcome,
        (width, height): (u32, u32),
        input_count: usize,
    ) -> Self {
        Self {
            surface: surface.to_string(),
            sequence,
            outcome,
            width,
            height,
            output_url: format!("/api/surfaces/{surface}/output.png?v={sequence}"),
            input_urls: (0..input_count)
                .map(|i| format!("/api/surfaces/{surface}/inputs/{i}.png?v={sequence}"))
                .collect(),
        }
    }
}

fn check_surface_id(id: &str) -> Result<(), ApiError> {
    if is_valid_surface_id(id) {
        Ok(())
    } else {
        Err(ApiError::InvalidParameter(format!(
            "invalid surface id '{id}' (letters, digits, '-' and '_', at most 64 characters)"
        )))
    }
}

fn default_source(url: Option<&str>, slot: &'static str) -> Result<ImageSource, ApiError> {
    url.map(|u| ImageSource::Url(u.to_string()))
        .ok_or(ApiError::MissingSource(slot))
}

/// Run a triggered invocation on its own task.
///
/// The task outlives the request, so a disconnected client still leaves its
/// ticket committed or failed.
async fn run_detached<F>(invocation: F) -> Result<Json<SurfaceUpdateResponse>, ApiError>
where
    F: Future<Output = Result<SurfaceUpdateResponse, ApiError>> + Send + 'static,
{
    let response = tokio::spawn(invocation)
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {e}")))??;
    Ok(Json(response))
}

async fn find_surface(state: &AppState, id: &str) -> Result<Arc<RenderSurface>, ApiError> {
    check_surface_id(id)?;
    state.surfaces.get(id).await.ok_or(ApiError::NotFound)
}

/// Run the single-image pipeline on a surface
///
/// The result is displayed only if no newer invocation was triggered on the
/// same surface in the meantime.
#[utoipa::path(
    post,
    path = "/api/surfaces/{id}/transform",
    request_body = TransformBody,
    responses(
        (status = 200, description = "Pipeline finished", body = SurfaceUpdateResponse),
        (status = 400, description = "Invalid operator or parameter"),
        (status = 413, description = "Request body too large"),
        (status = 422, description = "Image could not be loaded"),
    ),
    params(("id" = String, Path, description = "Surface id")),
    tag = "Surfaces"
)]
pub async fn handle_transform(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TransformBody>, JsonRejection>,
) -> Result<Json<SurfaceUpdateResponse>, ApiError> {
    check_surface_id(&id)?;
    let Json(body) = body?;
    let op = body.operator.to_point_op()?;
    let source = match body.source {
        Some(source) => source,
        None => default_source(
            state.config.defaults.for_operator(&body.operator),
            "source",
        )?,
    };

    let surface = state.surfaces.get_or_create(&id).await;
    let ticket = surface.begin().await;
    let sequence = ticket.sequence();
    tracing::debug!(surface = %id, sequence, operator = op.name(), "Transform triggered");

    let pipelines = state.pipelines.clone();
    run_detached(async move {
        match pipelines.run_transform(TransformRequest { source, op }).await {
            Ok(output) => {
                let dimensions = output.transformed.dimensions();
                let outcome = surface
                    .commit(
                        ticket,
                        OperatorSelection::from(op),
                        vec![output.original],
                        output.transformed,
                    )
                    .await;
                tracing::info!(surface = %id, sequence, ?outcome, "Transform committed");
                Ok(SurfaceUpdateResponse::new(
                    &id, sequence, outcome, dimensions, 1,
                ))
            }
            Err(e) => {
                tracing::warn!(surface = %id, sequence, error = %e, "Transform failed");
                surface.fail(ticket, e.to_string()).await;
                Err(ApiError::from(e))
            }
        }
    })
    .await
}

/// Run the two-image arithmetic pipeline on a surface
#[utoipa::path(
    post,
    path = "/api/surfaces/{id}/arithmetic",
    request_body = ArithmeticBody,
    responses(
        (status = 200, description = "Pipeline finished", body = SurfaceUpdateResponse),
        (status = 400, description = "Invalid operator"),
        (status = 413, description = "Request body too large"),
        (status = 422, description = "An image could not be loaded"),
    ),
    params(("id" = String, Path, description = "Surface id")),
    tag = "Surfaces"
)]
pub async fn handle_arithmetic(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ArithmeticBody>, JsonRejection>,
) -> Result<Json<SurfaceUpdateResponse>, ApiError> {
    check_surface_id(&id)?;
    let Json(body) = body?;
    let op = body.operator.to_arithmetic_op()?;
    let defaults = &state.config.defaults;
    let first = match body.first {
        Some(source) => source,
        None => default_source(defaults.arithmetic_slot(0), "first")?,
    };
    let second = match body.second {
        Some(source) => source,
        None => default_source(defaults.arithmetic_slot(1), "second")?,
    };

    let surface = state.surfaces.get_or_create(&id).await;
    let ticket = surface.begin().await;
    let sequence = ticket.sequence();
    tracing::debug!(surface = %id, sequence, operator = op.name(), "Arithmetic triggered");

    let pipelines = state.pipelines.clone();
    run_detached(async move {
        match pipelines
            .run_arithmetic(ArithmeticRequest { first, second, op })
            .await
        {
            Ok(output) => {
                let dimensions = output.combined.dimensions();
                let outcome = surface
                    .commit(
                        ticket,
                        OperatorSelection::from(op),
                        vec![output.first, output.second],
                        output.combined,
                    )
                    .await;
                tracing::info!(surface = %id, sequence, ?outcome, "Arithmetic committed");
                Ok(SurfaceUpdateResponse::new(
                    &id, sequence, outcome, dimensions, 2,
                ))
            }
            Err(e) => {
                tracing::warn!(surface = %id, sequence, error = %e, "Arithmetic failed");
                surface.fail(ticket, e.to_string()).await;
                Err(ApiError::from(e))
            }
        }
    })
    .await
}

/// Get the status of a surface
#[utoipa::path(
    get,
    path = "/api/surfaces/{id}",
    responses(
        (status = 200, description = "Surface status", body = SurfaceStatus),
        (status = 404, description = "Surface was never used"),
    ),
    params(("id" = String, Path, description = "Surface id")),
    tag = "Surfaces"
)]
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SurfaceStatus>, ApiError> {
    let surface = find_surface(&state, &id).await?;
    Ok(Json(surface.status().await))
}

/// Get the displayed output of a surface as PNG
#[utoipa::path(
    get,
    path = "/api/surfaces/{id}/output.png",
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 404, description = "No frame displayed yet"),
    ),
    params(("id" = String, Path, description = "Surface id")),
    tag = "Surfaces"
)]
pub async fn handle_output_png(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let surface = find_surface(&state, &id).await?;
    let frame = surface.frame().await.ok_or(ApiError::NotFound)?;
    png_response(&state, frame.output.clone()).await
}

/// Get a resampled input of the displayed frame as PNG
///
/// Index 0 is the original (or I1), index 1 is I2.
#[utoipa::path(
    get,
    path = "/api/surfaces/{id}/inputs/{index}.png",
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 404, description = "No such input"),
    ),
    params(
        ("id" = String, Path, description = "Surface id"),
        ("index" = usize, Path, description = "Input index"),
    ),
    tag = "Surfaces"
)]
pub async fn handle_input_png(
    State(state): State<AppState>,
    Path((id, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let index: usize = file
        .strip_suffix(".png")
        .and_then(|n| n.parse().ok())
        .ok_or(ApiError::NotFound)?;

    let surface = find_surface(&state, &id).await?;
    let frame = surface.frame().await.ok_or(ApiError::NotFound)?;
    let input = frame.inputs.get(index).ok_or(ApiError::NotFound)?;
    png_response(&state, input.clone()).await
}

async fn png_response(
    state: &AppState,
    image: point_ops::RasterImage,
) -> Result<Response, ApiError> {
    let png = encode_png_in_blocking_context(image, state.config.rendering.optimize_png).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    )
        .into_response())
}

/// Subscribe to frame and error events of a surface
#[utoipa::path(
    get,
    path = "/api/surfaces/{id}/events",
    responses(
        (status = 200, description = "Server-sent event stream", content_type = "text/event-stream"),
    ),
    params(("id" = String, Path, description = "Surface id")),
    tag = "Surfaces"
)]
pub async fn handle_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    check_surface_id(&id)?;
    let rx = state.surfaces.get_or_create(&id).await.subscribe();

    let stream = BroadcastStream::new(rx).map(|result| match result {
        Ok(event) => Ok(Event::default()
            .event(event.name())
            .data(serde_json::to_string(&event).unwrap_or_default())),
        // Lagged: the client should refetch the status
        Err(_) => Ok(Event::default().event("lagged").data("lagged")),
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
