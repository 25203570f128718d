use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use point_ops::{CurveTone, SampleDensity, TransferCurve, TransferFunction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::server::AppState;

/// Function to sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferOperator {
    #[serde(alias = "inverse")]
    Inversion,
    Gamma,
}

/// Named sampling density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DensityName {
    /// Every 5th input value
    #[default]
    Fine,
    /// Every 15th input value
    Coarse,
}

#[derive(Debug, Deserialize)]
pub struct TransferQuery {
    pub op: TransferOperator,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub density: DensityName,
    /// Explicit step, overrides `density`
    #[serde(default)]
    pub step: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SamplePoint {
    pub u: u8,
    pub v: u8,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    pub operator: String,
    pub gamma: Option<f64>,
    /// `lighten`, `darken` or `neutral`
    pub tone: String,
    /// Draw the identity line for comparison
    pub reference_line: bool,
    pub samples: Vec<SamplePoint>,
}

fn tone_name(tone: CurveTone) -> &'static str {
    match tone {
        CurveTone::Lighten => "lighten",
        CurveTone::Darken => "darken",
        CurveTone::Neutral => "neutral",
    }
}

/// Sample the transfer function of a point operator
///
/// Gamma samples use exactly the mapping applied to pixels.
#[utoipa::path(
    get,
    path = "/api/transfer",
    responses(
        (status = 200, description = "Sampled curve", body = TransferResponse),
        (status = 400, description = "Missing or invalid parameter"),
    ),
    params(
        ("op" = String, Query, description = "'inversion' or 'gamma'"),
        ("gamma" = Option<f64>, Query, description = "Exponent, required for 'gamma'"),
        ("density" = Option<String>, Query, description = "'fine' (step 5, default) or 'coarse' (step 15)"),
        ("step" = Option<u8>, Query, description = "Explicit step (at least 1)"),
    ),
    tag = "Transfer"
)]
pub async fn handle_transfer(
    State(state): State<AppState>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let Query(query) = query?;
    let function = match query.op {
        TransferOperator::Inversion => TransferFunction::Inversion,
        TransferOperator::Gamma => {
            let gamma = query.gamma.ok_or_else(|| {
                ApiError::InvalidParameter("'gamma' is required for op=gamma".to_string())
            })?;
            if !state.config.gamma.contains(gamma) {
                tracing::debug!(gamma, "Sampling gamma outside the advertised range");
            }
            TransferFunction::gamma(gamma).map_err(|e| ApiError::InvalidParameter(e.to_string()))?
        }
    };

    let density = match (query.step, query.density) {
        (Some(step), _) => SampleDensity::Step(step),
        (None, DensityName::Fine) => SampleDensity::Fine,
        (None, DensityName::Coarse) => SampleDensity::Coarse,
    };

    let curve = TransferCurve::new(function, density)
        .map_err(|e| ApiError::InvalidParameter(e.to_string()))?;

    let (operator, gamma) = match function {
        TransferFunction::Inversion => ("inversion", None),
        TransferFunction::Gamma(gamma) => ("gamma", Some(gamma)),
    };

    Ok(Json(TransferResponse {
        operator: operator.to_string(),
        gamma,
        tone: tone_name(function.tone()).to_string(),
        reference_line: gamma.is_some(),
        samples: curve
            .iter()
            .map(|s| SamplePoint { u: s.u, v: s.v })
            .collect(),
    }))
}
