//! API schemas for the model registry client
//!
//! This module contains the request and response schemas used for
//! communicating with an MLflow-compatible registry.
//!
//! # Organization
//!
//! - [`request`] - Query parameters sent to the API
//! - [`response`] - Schemas for data received from the API
//!
//! Common types are re-exported at the module level for convenience.

pub mod request;
pub mod response;

pub use request::*;
pub use response::*;
