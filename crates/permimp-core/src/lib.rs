//! Permutation feature importance: adapt, permute, score, aggregate, rank.
//!
//! Wraps any trained model behind a [`Model`] prediction function, binds it to
//! the true outcomes and a [`Loss`] through a [`PredictorAdapter`], and measures
//! how much the loss degrades when each feature's values are permuted across
//! instances. Supports random shuffling and exact all-pairs permutation, ratio
//! and difference scores, feature subsets and groups, seeded reproducibility,
//! parallel execution via rayon, and cancellation.

mod adapter;
mod cancel;
mod config;
mod engine;
mod error;
mod loss;
mod matrix;
mod model;
mod permute;
mod result;
mod summary;

pub use adapter::PredictorAdapter;
pub use cancel::CancelToken;
pub use config::{
    Execution, FeatureGroup, FeatureScope, ImportanceConfig, MAX_REPETITIONS, Method, ScoreMode,
};
pub use engine::compute;
pub use error::{AdapterError, BoxError, ImportanceError, MatrixError, SchemaMismatch, Stage};
pub use loss::{
    Loss, LossKind, MeanAbsoluteError, MeanSquaredError, MisclassificationRate, OneMinusAuc,
    ParseLossError, RootMeanSquaredError,
};
pub use matrix::{FeatureKind, FeatureMatrix};
pub use model::{FnModel, Model};
pub use result::{FeatureImportance, ImportanceTable};
pub use summary::Summary;
