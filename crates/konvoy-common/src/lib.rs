//! Common types for Konvoy: mesh CRDs, errors, configuration and utilities

#![deny(missing_docs)]

pub mod config;
pub mod crd;
pub mod error;
pub mod hash;
pub mod mesh;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Mesh a resource belongs to when none is declared
pub const DEFAULT_MESH: &str = "default";
