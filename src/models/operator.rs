use point_ops::{ArithmeticOp, PointOp, PointOpError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Operator chosen in the UI.
///
/// Serialized as `{"op": "gamma", "gamma": 2.2}`, `{"op": "inversion"}`, ...
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperatorSelection {
    Identity,
    #[serde(alias = "inverse")]
    Inversion,
    Gamma {
        /// Exponent, must be greater than 0 (the slider offers 0.1 to 3.0)
        gamma: f64,
    },
    Add,
    Subtract,
}

/// Error converting a selection into an operator for a given pipeline
#[derive(Debug, Error, PartialEq)]
pub enum OperatorError {
    #[error("operator '{op}' is not available in the {pipeline} pipeline")]
    Unsupported {
        op: &'static str,
        pipeline: &'static str,
    },

    #[error(transparent)]
    Invalid(#[from] PointOpError),
}

impl OperatorSelection {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorSelection::Identity => "identity",
            OperatorSelection::Inversion => "inversion",
            OperatorSelection::Gamma { .. } => "gamma",
            OperatorSelection::Add => "add",
            OperatorSelection::Subtract => "subtract",
        }
    }

    /// Gamma parameter, if this is a gamma selection
    pub fn gamma(&self) -> Option<f64> {
        match *self {
            OperatorSelection::Gamma { gamma } => Some(gamma),
            _ => None,
        }
    }

    /// Operator for the single-image pipeline
    pub fn to_point_op(&self) -> Result<PointOp, OperatorError> {
        match *self {
            OperatorSelection::Identity => Ok(PointOp::Identity),
            OperatorSelection::Inversion => Ok(PointOp::Inversion),
            OperatorSelection::Gamma { gamma } => Ok(PointOp::gamma(gamma)?),
            _ => Err(OperatorError::Unsupported {
                op: self.name(),
                pipeline: "transform",
            }),
        }
    }

    /// Operator for the two-image pipeline
    pub fn to_arithmetic_op(&self) -> Result<ArithmeticOp, OperatorError> {
        match self {
            OperatorSelection::Add => Ok(ArithmeticOp::Add),
            OperatorSelection::Subtract => Ok(ArithmeticOp::Subtract),
            _ => Err(OperatorError::Unsupported {
                op: self.name(),
                pipeline: "arithmetic",
            }),
        }
    }
}

impl From<PointOp> for OperatorSelection {
    fn from(op: PointOp) -> Self {
        match op {
            PointOp::Identity => OperatorSelection::Identity,
            PointOp::Inversion => OperatorSelection::Inversion,
            PointOp::Gamma(gamma) => OperatorSelection::Gamma { gamma },
        }
    }
}

impl From<ArithmeticOp> for OperatorSelection {
    fn from(op: ArithmeticOp) -> Self {
        match op {
            ArithmeticOp::Add => OperatorSelection::Add,
            ArithmeticOp::Subtract => OperatorSelection::Subtract,
        }
    }
}
