//! Hyperparameter search
//!
//! A [`Study`] is a fixed number of [`Trial`]s. Each trial asks a
//! [`Sampler`] for an assignment, fits a fresh model on the fitting part of
//! the training rows and scores it on the held-out part.

pub mod engine;
pub mod sampler;
pub mod space;
pub mod study;

pub use engine::{SamplerKind, SearchConfig, SearchEngine};
pub use sampler::{RandomSampler, Sampler, TpeOptions, TpeSampler};
pub use space::{HyperParams, ParamDomain, ParamValue, SearchSpace};
pub use study::{Study, Trial, TrialState};
