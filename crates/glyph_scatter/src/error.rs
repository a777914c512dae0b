//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! invalid configuration, malformed mesh input, isolated vertices, empty inputs,
//! and generic errors. Conditions that the sampling loop recovers from on its own
//! (a candidate that misses its polygon, a flat neighbourhood) never surface here.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("vertex {index} has no edge-connected neighbours")]
    IsolatedVertex { index: usize },

    #[error("{what} requires at least one point")]
    EmptyInput { what: &'static str },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
