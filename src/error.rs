//! Error types for the igso3 library
//!
//! This module provides the main error and result types used throughout the library.
//! All errors use the `thiserror` crate for automatic trait implementations.

use thiserror::Error;

/// Main result type used throughout the igso3 library
pub type Igso3Result<T> = Result<T, Igso3Error>;

/// Main error type for the igso3 library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Igso3Error {
    /// A configuration value or scalar argument is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A density evaluation produced a value unusable for the requested quantity
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// An angle-dependent function was evaluated outside of (0, π]
    #[error("Domain violation: {0}")]
    DomainViolation(String),
}

impl Igso3Error {
    /// Shorthand for [`Igso3Error::InvalidParameter`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Igso3Error::InvalidParameter(msg.into())
    }

    /// Shorthand for [`Igso3Error::NumericalInstability`].
    pub fn unstable(msg: impl Into<String>) -> Self {
        Igso3Error::NumericalInstability(msg.into())
    }

    /// Shorthand for [`Igso3Error::DomainViolation`].
    pub fn domain(msg: impl Into<String>) -> Self {
        Igso3Error::DomainViolation(msg.into())
    }
}
