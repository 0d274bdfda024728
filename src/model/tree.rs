//! Depth-limited regression trees fitted on gradient statistics.
//!
//! Features are pre-binned into quantile buckets so each node split is a
//! histogram scan. Bin 0 holds missing (NaN) values, which always route to
//! the left child.

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

/// Node of a fitted tree. Children are indices into the tree's node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Tree growth limits.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub l2_leaf_reg: f64,
    pub min_samples_leaf: usize,
}

impl RegressionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row[*feature];
                    idx = if x.is_nan() || x <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Every split must point forward to an existing node, so prediction
    /// stays in bounds and always reaches a leaf.
    pub fn check_structure(&self) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        bail!("node {} has invalid child index {}", idx, child);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Largest feature index referenced by a split, if any.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    /// Fit a tree to per-sample gradients and hessians.
    pub(crate) fn fit(binned: &BinnedMatrix, grad: &[f64], hess: &[f64], params: &TreeParams) -> Self {
        let mut builder = TreeBuilder {
            binned,
            grad,
            hess,
            params,
            nodes: Vec::new(),
        };
        let indices: Vec<usize> = (0..binned.n_rows).collect();
        builder.build(indices, 0);
        Self {
            nodes: builder.nodes,
        }
    }
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Column-major bin indices plus the cut points that produced them.
#[derive(Debug, Clone)]
pub(crate) struct BinnedMatrix {
    n_rows: usize,
    /// `cuts[f]` is sorted ascending; value `x` falls in bin `1 + #{c < x}`.
    cuts: Vec<Vec<f64>>,
    bins: Vec<Vec<u16>>,
}

impl BinnedMatrix {
    pub(crate) fn new(rows: &[Vec<f64>], n_features: usize, max_bins: usize) -> Self {
        let mut cuts = Vec::with_capacity(n_features);
        let mut bins = Vec::with_capacity(n_features);

        for f in 0..n_features {
            let column: Vec<f64> = rows.iter().map(|r| r[f]).collect();
            let feature_cuts = quantile_cuts(&column, max_bins);
            let feature_bins = column
                .iter()
                .map(|&x| {
                    if x.is_nan() {
                        0
                    } else {
                        1 + feature_cuts.partition_point(|&c| c < x) as u16
                    }
                })
                .collect();
            cuts.push(feature_cuts);
            bins.push(feature_bins);
        }

        Self {
            n_rows: rows.len(),
            cuts,
            bins,
        }
    }
}

fn quantile_cuts(column: &[f64], max_bins: usize) -> Vec<f64> {
    let mut values: Vec<f64> = column.iter().copied().filter(|x| !x.is_nan()).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    if values.len() < 2 {
        return Vec::new();
    }

    let midpoints: Vec<f64> = values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    if midpoints.len() <= max_bins {
        return midpoints;
    }

    let mut cuts: Vec<f64> = (1..=max_bins)
        .map(|q| midpoints[(q * midpoints.len() / (max_bins + 1)).min(midpoints.len() - 1)])
        .collect();
    cuts.dedup();
    cuts
}

// ---------------------------------------------------------------------------
// Greedy growth
// ---------------------------------------------------------------------------

struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a TreeParams,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    cut: usize,
    gain: f64,
}

impl TreeBuilder<'_> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.l2_leaf_reg)
    }

    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();

        let split = if depth < self.params.max_depth
            && indices.len() >= 2 * self.params.min_samples_leaf.max(1)
        {
            self.best_split(&indices, g, h)
        } else {
            None
        };

        let Some(split) = split else {
            self.nodes.push(Node::Leaf {
                value: -g / (h + self.params.l2_leaf_reg),
            });
            return self.nodes.len() - 1;
        };

        let boundary = (split.cut + 1) as u16;
        let column = &self.binned.bins[split.feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| column[i] <= boundary);

        let idx = self.nodes.len();
        // placeholder, patched once both children exist
        self.nodes.push(Node::Leaf { value: 0.0 });
        let left_idx = self.build(left, depth + 1);
        let right_idx = self.build(right, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: self.binned.cuts[split.feature][split.cut],
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn best_split(&self, indices: &[usize], g: f64, h: f64) -> Option<BestSplit> {
        let parent = self.score(g, h);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<BestSplit> = None;

        for (f, cuts) in self.binned.cuts.iter().enumerate() {
            if cuts.is_empty() {
                continue;
            }
            let n_bins = cuts.len() + 2;
            let mut hist_g = vec![0.0; n_bins];
            let mut hist_h = vec![0.0; n_bins];
            let mut hist_n = vec![0usize; n_bins];
            for &i in indices {
                let b = self.binned.bins[f][i] as usize;
                hist_g[b] += self.grad[i];
                hist_h[b] += self.hess[i];
                hist_n[b] += 1;
            }

            let (mut gl, mut hl, mut nl) = (0.0, 0.0, 0usize);
            // splitting at cut k sends bins 0..=k+1 left
            for k in 0..cuts.len() {
                let b = if k == 0 { 0..=1 } else { (k + 1)..=(k + 1) };
                for bin in b {
                    gl += hist_g[bin];
                    hl += hist_h[bin];
                    nl += hist_n[bin];
                }
                let nr = indices.len() - nl;
                if nl < min_leaf || nr < min_leaf {
                    continue;
                }
                let gain = self.score(gl, hl) + self.score(g - gl, h - hl) - parent;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature: f,
                        cut: k,
                        gain,
                    });
                }
            }
        }

        best
    }
}
