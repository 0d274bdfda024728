pub mod composition;
pub mod elements;
pub mod featurizer;

pub use composition::{Composition, CompositionError};
pub use elements::{Element, ElementData};
pub use featurizer::{ElementPropertyFeaturizer, FeatureMatrix};
