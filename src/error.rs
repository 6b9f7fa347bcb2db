//! Error types for tessella.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during triangulation and mesh generation.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A point lies outside the bounding rectangle of the triangulation.
    #[error("point ({x}, {y}) lies outside the triangulation bounds")]
    PointOutsideBounds {
        /// X coordinate of the rejected point.
        x: f64,
        /// Y coordinate of the rejected point.
        y: f64,
    },

    /// No vertex of the triangulation coincides with the given point.
    #[error("no vertex found at ({x}, {y})")]
    VertexNotFound {
        /// X coordinate of the query point.
        x: f64,
        /// Y coordinate of the query point.
        y: f64,
    },

    /// A geometric configuration too degenerate to process.
    #[error("degenerate geometry: {details}")]
    DegenerateGeometry {
        /// Description of the degenerate configuration.
        details: String,
    },

    /// The meshing domain contains no seed points.
    #[error("domain is empty: no seed points lie inside the distance function's zero level set")]
    EmptyDomain,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a degenerate geometry error.
    pub fn degenerate<T: std::fmt::Display>(details: T) -> Self {
        MeshError::DegenerateGeometry {
            details: details.to_string(),
        }
    }
}
