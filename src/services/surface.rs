//! Render surfaces: the drawables the UI shows, guarded against stale results.
//!
//! Every trigger takes a [`Ticket`] from [`RenderSurface::begin`]. Results are
//! committed only while their ticket is still the latest one issued for the
//! surface, so a slow invocation can never overwrite a newer frame.

use chrono::{DateTime, Utc};
use point_ops::RasterImage;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex, RwLock};
use utoipa::ToSchema;

use crate::models::OperatorSelection;

const EVENT_CAPACITY: usize = 16;
const MAX_SURFACE_ID_LEN: usize = 64;
const DEFAULT_MAX_SURFACES: usize = 64;

/// Surface ids are short slugs: ASCII letters, digits, `-` and `_`
pub fn is_valid_surface_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SURFACE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Claim on the next frame of a surface, issued at trigger time
#[derive(Debug)]
pub struct Ticket {
    sequence: u64,
}

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Whether a committed result became the displayed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    Applied,
    /// A newer ticket was issued; the result was discarded
    Superseded,
}

/// A displayed frame: the resampled inputs and the processed output
#[derive(Debug)]
pub struct Frame {
    pub sequence: u64,
    pub operator: OperatorSelection,
    pub inputs: Vec<RasterImage>,
    pub output: RasterImage,
    pub rendered_at: DateTime<Utc>,
}

/// Event pushed to surface subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceEvent {
    Frame {
        sequence: u64,
        operator: OperatorSelection,
        width: u32,
        height: u32,
    },
    Error {
        sequence: u64,
        message: String,
    },
}

impl SurfaceEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceEvent::Frame { .. } => "frame",
            SurfaceEvent::Error { .. } => "error",
        }
    }
}

/// Snapshot of a surface for the status endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SurfaceStatus {
    pub id: String,
    /// An invocation for the latest ticket is still running
    pub processing: bool,
    /// Most recently issued ticket (0 if never triggered)
    pub latest_sequence: u64,
    /// Ticket of the displayed frame
    pub applied_sequence: Option<u64>,
    /// Error of the latest failed invocation, cleared by the next success
    pub last_error: Option<String>,
    pub operator: Option<OperatorSelection>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub input_count: usize,
    pub rendered_at: Option<DateTime<Utc>>,
}

struct SurfaceState {
    latest_issued: u64,
    processing: bool,
    last_error: Option<String>,
    frame: Option<Arc<Frame>>,
    last_active: Instant,
}

impl SurfaceState {
    fn new() -> Self {
        Self {
            latest_issued: 0,
            processing: false,
            last_error: None,
            frame: None,
            last_active: Instant::now(),
        }
    }
}

/// One drawable surface
pub struct RenderSurface {
    id: String,
    state: Mutex<SurfaceState>,
    events: broadcast::Sender<SurfaceEvent>,
}

impl RenderSurface {
    pub fn new(id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: id.into(),
            state: Mutex::new(SurfaceState::new()),
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Issue a new ticket and mark the surface as processing
    pub async fn begin(&self) -> Ticket {
        let mut state = self.state.lock().await;
        state.latest_issued += 1;
        state.processing = true;
        state.last_active = Instant::now();
        Ticket {
            sequence: state.latest_issued,
        }
    }

    /// Display a result if its ticket is still the latest one
    pub async fn commit(
        &self,
        ticket: Ticket,
        operator: OperatorSelection,
        inputs: Vec<RasterImage>,
        output: RasterImage,
    ) -> CommitOutcome {
        let mut state = self.state.lock().await;
        if ticket.sequence != state.latest_issued {
            tracing::debug!(
                surface = %self.id,
                sequence = ticket.sequence,
                latest = state.latest_issued,
                "Discarding superseded result"
            );
            return CommitOutcome::Superseded;
        }

        let (width, height) = output.dimensions();
        state.frame = Some(Arc::new(Frame {
            sequence: ticket.sequence,
            operator,
            inputs,
            output,
            rendered_at: Utc::now(),
        }));
        state.processing = false;
        state.last_error = None;
        state.last_active = Instant::now();
        drop(state);

        // No subscribers is fine
        let _ = self.events.send(SurfaceEvent::Frame {
            sequence: ticket.sequence,
            operator,
            width,
            height,
        });
        CommitOutcome::Applied
    }

    /// Record a failed invocation; the displayed frame is kept.
    ///
    /// Failures of superseded tickets are ignored.
    pub async fn fail(&self, ticket: Ticket, message: impl Into<String>) -> CommitOutcome {
        let mut state = self.state.lock().await;
        if ticket.sequence != state.latest_issued {
            return CommitOutcome::Superseded;
        }

        let message = message.into();
        state.processing = false;
        state.last_error = Some(message.clone());
        state.last_active = Instant::now();
        drop(state);

        let _ = self.events.send(SurfaceEvent::Error {
            sequence: ticket.sequence,
            message,
        });
        CommitOutcome::Applied
    }

    /// Currently displayed frame
    pub async fn frame(&self) -> Option<Arc<Frame>> {
        self.state.lock().await.frame.clone()
    }

    pub async fn status(&self) -> SurfaceStatus {
        let state = self.state.lock().await;
        let frame = state.frame.as_deref();
        SurfaceStatus {
            id: self.id.clone(),
            processing: state.processing,
            latest_sequence: state.latest_issued,
            applied_sequence: frame.map(|f| f.sequence),
            last_error: state.last_error.clone(),
            operator: frame.map(|f| f.operator),
            width: frame.map(|f| f.output.width()),
            height: frame.map(|f| f.output.height()),
            input_count: frame.map_or(0, |f| f.inputs.len()),
            rendered_at: frame.map(|f| f.rendered_at),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.events.subscribe()
    }

    /// Last activity, or `None` while the surface is processing, locked or
    /// watched by an event subscriber
    fn idle_since(&self) -> Option<Instant> {
        if self.events.receiver_count() > 0 {
            return None;
        }
        let state = self.state.try_lock().ok()?;
        (!state.processing).then_some(state.last_active)
    }
}

/// Surfaces keyed by id, created on first use.
///
/// Creating a surface beyond the limit evicts the least recently used idle
/// one. Surfaces still referenced elsewhere (a running invocation holds one)
/// are never evicted.
pub struct SurfaceRegistry {
    surfaces: RwLock<HashMap<String, Arc<RenderSurface>>>,
    max_surfaces: usize,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_SURFACES)
    }

    pub fn with_limit(max_surfaces: usize) -> Self {
        Self {
            surfaces: RwLock::new(HashMap::new()),
            max_surfaces: max_surfaces.max(1),
        }
    }

    pub async fn get(&self, id: &str) -> Option<Arc<RenderSurface>> {
        let surfaces = self.surfaces.read().await;
        surfaces.get(id).cloned()
    }

    pub async fn get_or_create(&self, id: &str) -> Arc<RenderSurface> {
        if let Some(surface) = self.get(id).await {
            return surface;
        }

        let mut surfaces = self.surfaces.write().await;
        if let Some(surface) = surfaces.get(id) {
            return surface.clone();
        }
        if surfaces.len() >= self.max_surfaces {
            evict_idle(&mut surfaces);
        }

        tracing::debug!(surface = %id, "Creating render surface");
        let surface = Arc::new(RenderSurface::new(id));
        surfaces.insert(id.to_string(), surface.clone());
        surface
    }

    pub async fn len(&self) -> usize {
        self.surfaces.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn evict_idle(surfaces: &mut HashMap<String, Arc<RenderSurface>>) {
    let oldest = surfaces
        .iter()
        .filter(|(_, surface)| Arc::strong_count(*surface) == 1)
        .filter_map(|(id, surface)| surface.idle_since().map(|at| (at, id)))
        .min_by_key(|(at, _)| *at)
        .map(|(_, id)| id.clone());

    match oldest {
        Some(id) => {
            surfaces.remove(&id);
            tracing::debug!(surface = %id, "Evicted idle render surface");
        }
        None => tracing::warn!(
            count = surfaces.len(),
            "Surface limit reached but every surface is in use"
        ),
    }
}
