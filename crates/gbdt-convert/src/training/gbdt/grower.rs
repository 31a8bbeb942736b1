//! Depth-wise tree growing over gradient histograms.

use crate::data::BinnedMatrix;
use crate::data::binned::MISSING_BIN;
use crate::repr::gbdt::{MutableTree, NodeId};
use crate::training::Gradients;

use super::gain::GainParams;
use super::histogram::{Histogram, HistogramBin, HistogramLayout};

/// Smallest gain accepted as an improvement.
const MIN_SPLIT_GAIN: f64 = 1e-6;

/// Parameters for growing a single tree.
#[derive(Debug, Clone)]
pub struct GrowerParams {
    pub gain: GainParams,
    pub learning_rate: f32,
    pub max_depth: u32,
}

/// Best split found for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitCandidate {
    pub feature: usize,
    /// Bins `0..=bin` go left.
    pub bin: usize,
    pub default_left: bool,
    pub gain: f64,
    pub left_sum: HistogramBin,
    pub right_sum: HistogramBin,
}

struct NodeState {
    id: NodeId,
    rows: Vec<u32>,
    hist: Histogram,
    sum: HistogramBin,
}

/// Grows one tree at a time against a fixed binned matrix.
pub struct TreeGrower<'a> {
    binned: &'a BinnedMatrix,
    layout: HistogramLayout,
    params: GrowerParams,
}

impl<'a> TreeGrower<'a> {
    pub fn new(binned: &'a BinnedMatrix, params: GrowerParams) -> Self {
        Self {
            layout: HistogramLayout::new(binned),
            binned,
            params,
        }
    }

    /// Grow a tree on `rows`, considering only `features`.
    ///
    /// Leaves hold `learning_rate * weight`; split nodes keep their own scaled
    /// weight, gain and cover.
    pub fn grow(&self, gradients: &Gradients, rows: &[u32], features: &[usize]) -> MutableTree {
        let mut tree = MutableTree::with_capacity(2usize.pow(self.params.max_depth.min(16) + 1));
        let root = tree.init_root();

        let mut frontier = vec![NodeState {
            id: root,
            rows: rows.to_vec(),
            hist: Histogram::build(&self.layout, self.binned, gradients, rows, features),
            sum: gradients.sum_rows(rows),
        }];
        let mut depth = 0u32;

        while !frontier.is_empty() {
            let mut next = Vec::with_capacity(frontier.len() * 2);
            for node in frontier {
                let weight = self.scaled_weight(node.sum);
                tree.set_cover(node.id, node.sum.1 as f32);

                let split = if depth < self.params.max_depth {
                    self.find_best_split(&node.hist, features)
                } else {
                    None
                };

                let Some(split) = split else {
                    tree.make_leaf(node.id, weight);
                    continue;
                };

                let threshold = self.binned.mapper(split.feature).threshold(split.bin);
                let (left_id, right_id) = tree.apply_numeric_split(
                    node.id,
                    split.feature as u32,
                    threshold,
                    split.default_left,
                    split.gain as f32,
                    weight,
                );

                let (left_rows, right_rows) = self.partition(&node.rows, &split);
                // Build the smaller child directly, derive the other.
                let (left_hist, right_hist) = if left_rows.len() <= right_rows.len() {
                    let left = Histogram::build(&self.layout, self.binned, gradients, &left_rows, features);
                    let right = left.sibling_of(&node.hist);
                    (left, right)
                } else {
                    let right = Histogram::build(&self.layout, self.binned, gradients, &right_rows, features);
                    let left = right.sibling_of(&node.hist);
                    (left, right)
                };

                next.push(NodeState {
                    id: left_id,
                    rows: left_rows,
                    hist: left_hist,
                    sum: split.left_sum,
                });
                next.push(NodeState {
                    id: right_id,
                    rows: right_rows,
                    hist: right_hist,
                    sum: split.right_sum,
                });
            }
            frontier = next;
            depth += 1;
        }

        tree
    }

    fn scaled_weight(&self, (sum_grad, sum_hess): HistogramBin) -> f32 {
        (self.params.gain.compute_leaf_weight(sum_grad, sum_hess) * self.params.learning_rate as f64) as f32
    }

    /// Scan every feature's bins for the highest-gain split, trying missing
    /// values on both sides.
    pub fn find_best_split(&self, hist: &Histogram, features: &[usize]) -> Option<SplitCandidate> {
        let gain = &self.params.gain;
        let mut best: Option<SplitCandidate> = None;

        for &feature in features {
            let bins = hist.feature_bins(&self.layout, feature);
            if bins.len() < 2 {
                continue;
            }
            let missing = hist.missing(feature);
            let total = bins
                .iter()
                .fold((0.0, 0.0), |(g, h), &(bg, bh)| (g + bg, h + bh));
            let has_missing = missing.1 > 0.0;

            let mut acc: HistogramBin = (0.0, 0.0);
            for (bin, &(bg, bh)) in bins[..bins.len() - 1].iter().enumerate() {
                acc = (acc.0 + bg, acc.1 + bh);
                let rest = (total.0 - acc.0, total.1 - acc.1);

                let directions: &[bool] = if has_missing { &[false, true] } else { &[true] };
                for &default_left in directions {
                    let (left, right) = if default_left {
                        ((acc.0 + missing.0, acc.1 + missing.1), rest)
                    } else {
                        (acc, (rest.0 + missing.0, rest.1 + missing.1))
                    };
                    if left.1 <= 0.0 || right.1 <= 0.0 || !gain.is_valid_split(left.1, right.1) {
                        continue;
                    }
                    let split_gain = gain.compute_gain(left.0, left.1, right.0, right.1);
                    if split_gain.is_nan() || split_gain <= MIN_SPLIT_GAIN {
                        continue;
                    }
                    if best.as_ref().is_none_or(|b| split_gain > b.gain) {
                        best = Some(SplitCandidate {
                            feature,
                            bin,
                            default_left,
                            gain: split_gain,
                            left_sum: left,
                            right_sum: right,
                        });
                    }
                }
            }
        }

        best
    }

    fn partition(&self, rows: &[u32], split: &SplitCandidate) -> (Vec<u32>, Vec<u32>) {
        let column = self.binned.feature_bins(split.feature);
        rows.iter().copied().partition(|&row| {
            let bin = column[row as usize];
            if bin == MISSING_BIN {
                split.default_left
            } else {
                bin as usize <= split.bin
            }
        })
    }
}
