//! Magpie-style element-property featurization.
//!
//! Each feature is a statistic of one element property over the elements of
//! a composition, weighted by atomic fraction. Column names follow the
//! `"MagpieData {stat} {property}"` convention.

use crate::chem::composition::Composition;
use crate::chem::elements::Element;
use serde::{Deserialize, Serialize};

/// Element properties available to the featurizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementProperty {
    Number,
    AtomicWeight,
    Row,
    Column,
    Electronegativity,
}

impl ElementProperty {
    pub fn label(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::AtomicWeight => "AtomicWeight",
            Self::Row => "Row",
            Self::Column => "Column",
            Self::Electronegativity => "Electronegativity",
        }
    }

    /// Property value for `element`; NaN when the table has no value.
    pub fn value(self, element: Element) -> f64 {
        let data = element.data();
        match self {
            Self::Number => f64::from(data.number),
            Self::AtomicWeight => data.atomic_weight,
            Self::Row => f64::from(data.row),
            Self::Column => f64::from(data.column),
            Self::Electronegativity => data.electronegativity.unwrap_or(f64::NAN),
        }
    }
}

/// Fraction-weighted statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    Minimum,
    Maximum,
    Range,
    Mean,
    AvgDev,
    Mode,
}

impl Stat {
    pub fn label(self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Range => "range",
            Self::Mean => "mean",
            Self::AvgDev => "avg_dev",
            Self::Mode => "mode",
        }
    }

    /// Compute the statistic over `(value, weight)` pairs. Weights sum to 1.
    fn compute(self, pairs: &[(f64, f64)]) -> f64 {
        if pairs.is_empty() || pairs.iter().any(|(v, _)| v.is_nan()) {
            return f64::NAN;
        }
        let min = pairs.iter().map(|(v, _)| *v).fold(f64::INFINITY, f64::min);
        let max = pairs
            .iter()
            .map(|(v, _)| *v)
            .fold(f64::NEG_INFINITY, f64::max);
        let mean: f64 = pairs.iter().map(|(v, w)| v * w).sum();

        match self {
            Self::Minimum => min,
            Self::Maximum => max,
            Self::Range => max - min,
            Self::Mean => mean,
            Self::AvgDev => pairs.iter().map(|(v, w)| w * (v - mean).abs()).sum(),
            Self::Mode => {
                let top = pairs.iter().map(|(_, w)| *w).fold(f64::NEG_INFINITY, f64::max);
                pairs
                    .iter()
                    .filter(|(_, w)| (top - w).abs() < 1e-12)
                    .map(|(v, _)| *v)
                    .fold(f64::INFINITY, f64::min)
            }
        }
    }
}

/// A dense feature matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Reorder rows so that row `i` becomes `self.rows[order[i]]`.
    pub fn reorder(&mut self, order: &[usize]) {
        self.rows = order.iter().map(|&i| self.rows[i].clone()).collect();
    }
}

/// Computes element-property statistics for compositions.
#[derive(Debug, Clone)]
pub struct ElementPropertyFeaturizer {
    properties: Vec<ElementProperty>,
    stats: Vec<Stat>,
}

impl Default for ElementPropertyFeaturizer {
    fn default() -> Self {
        Self::magpie()
    }
}

impl ElementPropertyFeaturizer {
    pub fn new(properties: Vec<ElementProperty>, stats: Vec<Stat>) -> Self {
        Self { properties, stats }
    }

    /// The preset used for both training and prediction.
    pub fn magpie() -> Self {
        Self::new(
            vec![
                ElementProperty::Number,
                ElementProperty::AtomicWeight,
                ElementProperty::Row,
                ElementProperty::Column,
                ElementProperty::Electronegativity,
            ],
            vec![
                Stat::Minimum,
                Stat::Maximum,
                Stat::Range,
                Stat::Mean,
                Stat::AvgDev,
                Stat::Mode,
            ],
        )
    }

    pub fn feature_labels(&self) -> Vec<String> {
        self.properties
            .iter()
            .flat_map(|p| {
                self.stats
                    .iter()
                    .map(move |s| format!("MagpieData {} {}", s.label(), p.label()))
            })
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.properties.len() * self.stats.len()
    }

    /// Feature vector for one composition.
    pub fn featurize(&self, composition: &Composition) -> Vec<f64> {
        let fractions = composition.fractions();
        let mut out = Vec::with_capacity(self.n_features());
        for property in &self.properties {
            let pairs: Vec<(f64, f64)> = fractions
                .iter()
                .map(|(e, w)| (property.value(*e), *w))
                .collect();
            out.extend(self.stats.iter().map(|s| s.compute(&pairs)));
        }
        out
    }

    /// Featurize a column of optional compositions; missing ones yield NaN rows.
    pub fn featurize_all(&self, compositions: &[Option<Composition>]) -> FeatureMatrix {
        let rows = compositions
            .iter()
            .map(|c| match c {
                Some(comp) => self.featurize(comp),
                None => vec![f64::NAN; self.n_features()],
            })
            .collect();
        FeatureMatrix {
            columns: self.feature_labels(),
            rows,
        }
    }
}
