//! # Model Scorer
//!
//! Load the newest registered version of a binary classifier from a model
//! registry and score single feature vectors with it.

mod loader;
mod predictor;

pub mod bundle;
pub mod classifier;
pub mod config;
pub mod error;
pub mod frame;
pub mod models;
pub mod registry;

pub use crate::config::{ConfigError, ScorerConfig, ScorerConfigBuilder};
pub use crate::error::{LoadError, PredictError};
pub use crate::frame::{FeatureFrame, FeatureVector};
pub use crate::loader::ModelLoader;
pub use crate::predictor::LoadedModel;
pub use model_scorer_api::RegistryCredentials;
