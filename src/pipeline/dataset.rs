//! The working table of one session plus everything derived from it.

use crate::chem::{Composition, ElementPropertyFeaturizer, FeatureMatrix};
use crate::error::PipelineError;
use crate::pipeline::table::Table;
use std::collections::HashSet;

pub const SUBSTANCE_COLUMN: &str = "Substance";
pub const COMPOSITION_COLUMN: &str = "composition";
pub const SCORE_COLUMN: &str = "pred";
pub const MATCH_COLUMN: &str = "rule_match";

/// Columns this crate writes itself; dropped when a saved file is re-read.
const DERIVED_COLUMNS: [&str; 3] = [COMPOSITION_COLUMN, SCORE_COLUMN, MATCH_COLUMN];

/// In-memory dataset mutated by the pipeline stages.
///
/// `compositions` and `features` are set together by a successful load;
/// `scores` and the match artifacts are cleared whenever a new file is
/// loaded, so every parallel vector always has `rows.len()` entries.
#[derive(Debug, Clone, Default)]
pub struct MaterialDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    substance_index: usize,
    compositions: Option<Vec<Option<Composition>>>,
    features: Option<FeatureMatrix>,
    scores: Option<Vec<f64>>,
    match_flags: Option<Vec<bool>>,
    matched: Option<Table>,
}

impl MaterialDataset {
    /// Build a loaded dataset from a raw table.
    pub fn from_table(
        table: Table,
        featurizer: &ElementPropertyFeaturizer,
    ) -> Result<Self, PipelineError> {
        table.require_column(SUBSTANCE_COLUMN)?;

        let keep: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !DERIVED_COLUMNS.contains(&c.as_str()))
            .map(|(i, _)| i)
            .collect();
        let columns: Vec<String> = keep.iter().map(|&i| table.columns[i].clone()).collect();
        let rows: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|r| keep.iter().map(|&i| r.get(i).cloned().unwrap_or_default()).collect())
            .collect();
        let substance_index = columns
            .iter()
            .position(|c| c == SUBSTANCE_COLUMN)
            .ok_or_else(|| PipelineError::MissingColumn(SUBSTANCE_COLUMN.into()))?;

        let compositions: Vec<Option<Composition>> = rows
            .iter()
            .map(|r| Composition::parse(&r[substance_index]))
            .collect();
        let features = featurizer.featurize_all(&compositions);

        Ok(Self {
            columns,
            rows,
            substance_index,
            compositions: Some(compositions),
            features: Some(features),
            scores: None,
            match_flags: None,
            matched: None,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.features.is_some()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw substance strings in current row order.
    pub fn substances(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r[self.substance_index].as_str())
            .collect()
    }

    pub fn compositions(&self) -> Option<&[Option<Composition>]> {
        self.compositions.as_deref()
    }

    pub fn parsed_count(&self) -> usize {
        self.compositions
            .as_ref()
            .map_or(0, |c| c.iter().filter(|x| x.is_some()).count())
    }

    pub fn features(&self) -> Option<&FeatureMatrix> {
        self.features.as_ref()
    }

    pub fn scores(&self) -> Option<&[f64]> {
        self.scores.as_deref()
    }

    pub fn match_flags(&self) -> Option<&[bool]> {
        self.match_flags.as_deref()
    }

    pub fn matched(&self) -> Option<&Table> {
        self.matched.as_ref()
    }

    /// Store scores and reorder every row-aligned artifact by descending score.
    ///
    /// The sort is stable, so equal scores keep their relative order and a
    /// second call with the same scores leaves the order unchanged.
    pub fn apply_scores(&mut self, scores: Vec<f64>) {
        debug_assert_eq!(scores.len(), self.rows.len());
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        self.rows = permute(&self.rows, &order);
        if let Some(compositions) = &self.compositions {
            self.compositions = Some(permute(compositions, &order));
        }
        if let Some(features) = &mut self.features {
            features.reorder(&order);
        }
        if let Some(flags) = &self.match_flags {
            self.match_flags = Some(permute(flags, &order));
        }
        self.scores = Some(permute(&scores, &order));
    }

    /// Flag rows whose composition contains any of `elements`.
    ///
    /// Returns the flags and the matched snapshot without committing them.
    pub fn compute_match(&self, elements: &HashSet<String>) -> Option<(Vec<bool>, Table)> {
        let compositions = self.compositions.as_ref()?;
        let flags: Vec<bool> = compositions
            .iter()
            .map(|c| c.as_ref().is_some_and(|comp| comp.contains_any(elements)))
            .collect();

        let mut columns = self.columns.clone();
        columns.push(COMPOSITION_COLUMN.into());
        if self.scores.is_some() {
            columns.push(SCORE_COLUMN.into());
        }
        columns.push(MATCH_COLUMN.into());

        let rows = flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(i, _)| self.render_matched_row(i))
            .collect();

        Some((flags, Table { columns, rows }))
    }

    pub fn apply_match(&mut self, flags: Vec<bool>, matched: Table) {
        self.match_flags = Some(flags);
        self.matched = Some(matched);
    }

    fn render_matched_row(&self, i: usize) -> Vec<String> {
        let mut row = self.rows[i].clone();
        let composition = self
            .compositions
            .as_ref()
            .and_then(|c| c[i].as_ref())
            .map(Composition::formula)
            .unwrap_or_default();
        row.push(composition);
        if let Some(scores) = &self.scores {
            row.push(scores[i].to_string());
        }
        row.push("True".into());
        row
    }
}

fn permute<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(substances: &[&str]) -> Table {
        Table {
            columns: vec!["id".into(), SUBSTANCE_COLUMN.into()],
            rows: substances
                .iter()
                .enumerate()
                .map(|(i, s)| vec![i.to_string(), s.to_string()])
                .collect(),
        }
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn load_keeps_unparseable_rows() {
        let ds = MaterialDataset::from_table(
            table(&["Fe2O3", "not a formula", "NaCl"]),
            &ElementPropertyFeaturizer::magpie(),
        )
        .unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.parsed_count(), 2);
        assert_eq!(ds.features().unwrap().n_rows(), 3);
        assert!(ds.scores().is_none());
        assert!(ds.matched().is_none());
    }

    #[test]
    fn derived_columns_are_dropped_on_load() {
        let t = Table {
            columns: vec![
                SUBSTANCE_COLUMN.into(),
                COMPOSITION_COLUMN.into(),
                SCORE_COLUMN.into(),
                MATCH_COLUMN.into(),
            ],
            rows: vec![vec!["Fe".into(), "Fe1".into(), "0.3".into(), "True".into()]],
        };
        let ds = MaterialDataset::from_table(t, &ElementPropertyFeaturizer::magpie()).unwrap();
        assert_eq!(ds.columns(), &[SUBSTANCE_COLUMN.to_string()]);
    }

    #[test]
    fn missing_substance_column_is_rejected() {
        let t = Table {
            columns: vec!["formula".into()],
            rows: vec![vec!["Fe".into()]],
        };
        let err = MaterialDataset::from_table(t, &ElementPropertyFeaturizer::magpie()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == SUBSTANCE_COLUMN));
    }

    #[test]
    fn scores_reorder_all_parallel_artifacts() {
        let mut ds = MaterialDataset::from_table(
            table(&["Fe", "Co", "Ni"]),
            &ElementPropertyFeaturizer::magpie(),
        )
        .unwrap();
        let first_features = ds.features().unwrap().rows.clone();
        let (flags, matched) = ds.compute_match(&set(&["Co"])).unwrap();
        ds.apply_match(flags, matched);

        ds.apply_scores(vec![0.1, 0.9, 0.5]);
        assert_eq!(ds.substances(), vec!["Co", "Ni", "Fe"]);
        assert_eq!(ds.scores().unwrap(), &[0.9, 0.5, 0.1]);
        assert_eq!(ds.match_flags().unwrap(), &[true, false, false]);
        assert_eq!(ds.features().unwrap().rows[0], first_features[1]);
        assert_eq!(ds.compositions().unwrap()[2].as_ref().unwrap().formula(), "Fe1");
    }

    #[test]
    fn equal_scores_keep_order() {
        let mut ds = MaterialDataset::from_table(
            table(&["Fe", "Co", "Ni"]),
            &ElementPropertyFeaturizer::magpie(),
        )
        .unwrap();
        ds.apply_scores(vec![0.5, 0.5, 0.5]);
        assert_eq!(ds.substances(), vec!["Fe", "Co", "Ni"]);
    }

    #[test]
    fn matched_snapshot_includes_score_column_after_predict() {
        let mut ds = MaterialDataset::from_table(
            table(&["Fe", "Cu"]),
            &ElementPropertyFeaturizer::magpie(),
        )
        .unwrap();
        let (_, before) = ds.compute_match(&set(&["Fe"])).unwrap();
        assert_eq!(
            before.columns,
            vec!["id", SUBSTANCE_COLUMN, COMPOSITION_COLUMN, MATCH_COLUMN]
        );

        ds.apply_scores(vec![0.25, 0.75]);
        let (flags, after) = ds.compute_match(&set(&["Fe"])).unwrap();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(
            after.columns,
            vec!["id", SUBSTANCE_COLUMN, COMPOSITION_COLUMN, SCORE_COLUMN, MATCH_COLUMN]
        );
        assert_eq!(after.rows, vec![vec!["0", "Fe", "Fe1", "0.25", "True"]]);
    }

    #[test]
    fn empty_dataset_cannot_match() {
        let ds = MaterialDataset::default();
        assert!(!ds.is_loaded());
        assert!(ds.compute_match(&set(&["Fe"])).is_none());
    }
}
