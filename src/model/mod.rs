//! Binary classifier used to score material compositions.

pub mod boosting;
pub mod metrics;
pub mod tree;

pub use boosting::{BoostingParams, GradientBoostedClassifier};
pub use metrics::ClassificationMetrics;
