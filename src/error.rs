//! Error types for city generation

use std::fmt;

/// Errors that can occur during city generation or queries
#[derive(Debug, Clone, PartialEq)]
pub enum CityError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// A generation stage could not proceed
    GenerationFailed(String),
    /// A cell profile name did not match any known profile
    UnknownProfile(String),
    /// Cycle extraction ran on a graph whose embedding does not match its topology
    InconsistentEmbedding(String),
}

impl fmt::Display for CityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CityError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            CityError::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
            CityError::UnknownProfile(name) => write!(f, "unknown cell profile: {}", name),
            CityError::InconsistentEmbedding(msg) => {
                write!(f, "inconsistent planar embedding: {}", msg)
            }
        }
    }
}

impl std::error::Error for CityError {}

/// Result type alias for city generation operations
pub type Result<T> = std::result::Result<T, CityError>;
