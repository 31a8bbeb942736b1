//! Gradient histograms over binned features.
//!
//! Bins are plain `(sum_grad, sum_hess)` tuples in f64. One histogram covers
//! every feature of a node, laid out feature after feature, plus one
//! missing-value bin per feature. Sibling histograms are derived with the
//! subtraction trick (sibling = parent - child).

use crate::data::BinnedMatrix;
use crate::data::binned::MISSING_BIN;
use crate::training::Gradients;

/// `(sum_grad, sum_hess)`.
pub type HistogramBin = (f64, f64);

/// Where each feature's bins start in the flat bin buffer.
#[derive(Debug, Clone)]
pub struct HistogramLayout {
    offsets: Vec<usize>,
}

impl HistogramLayout {
    pub fn new(binned: &BinnedMatrix) -> Self {
        let mut offsets = Vec::with_capacity(binned.n_features() + 1);
        let mut total = 0;
        offsets.push(0);
        for f in 0..binned.n_features() {
            total += binned.mapper(f).n_bins();
            offsets.push(total);
        }
        Self { offsets }
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn total_bins(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    #[inline]
    fn range(&self, feature: usize) -> std::ops::Range<usize> {
        self.offsets[feature]..self.offsets[feature + 1]
    }
}

/// Histogram of one tree node.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: Vec<HistogramBin>,
    missing: Vec<HistogramBin>,
}

impl Histogram {
    pub fn zeros(layout: &HistogramLayout) -> Self {
        Self {
            bins: vec![(0.0, 0.0); layout.total_bins()],
            missing: vec![(0.0, 0.0); layout.n_features()],
        }
    }

    /// Accumulate the gradients of `rows` for the given features.
    pub fn build(
        layout: &HistogramLayout,
        binned: &BinnedMatrix,
        gradients: &Gradients,
        rows: &[u32],
        features: &[usize],
    ) -> Self {
        let mut hist = Self::zeros(layout);
        let pairs = gradients.pairs();
        for &feature in features {
            let offset = layout.offsets[feature];
            let column = binned.feature_bins(feature);
            for &row in rows {
                let pair = pairs[row as usize];
                let bin = column[row as usize];
                let slot = if bin == MISSING_BIN {
                    &mut hist.missing[feature]
                } else {
                    &mut hist.bins[offset + bin as usize]
                };
                slot.0 += pair.grad as f64;
                slot.1 += pair.hess as f64;
            }
        }
        hist
    }

    /// `parent - self`, i.e. the sibling's histogram.
    pub fn sibling_of(&self, parent: &Histogram) -> Histogram {
        let sub = |(pg, ph): &HistogramBin, (cg, ch): &HistogramBin| (pg - cg, ph - ch);
        Self {
            bins: parent.bins.iter().zip(&self.bins).map(|(p, c)| sub(p, c)).collect(),
            missing: parent.missing.iter().zip(&self.missing).map(|(p, c)| sub(p, c)).collect(),
        }
    }

    /// Non-missing bins of one feature.
    #[inline]
    pub fn feature_bins<'a>(&'a self, layout: &HistogramLayout, feature: usize) -> &'a [HistogramBin] {
        &self.bins[layout.range(feature)]
    }

    #[inline]
    pub fn missing(&self, feature: usize) -> HistogramBin {
        self.missing[feature]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::GradsTuple;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn setup() -> (BinnedMatrix, Gradients) {
        let features = array![[1.0f32], [2.0], [f32::NAN], [2.0]];
        let binned = BinnedMatrix::from_features(features.view(), 256);
        let mut grads = Gradients::new(4);
        for (i, p) in grads.pairs_mut().iter_mut().enumerate() {
            *p = GradsTuple {
                grad: (i + 1) as f32,
                hess: 1.0,
            };
        }
        (binned, grads)
    }

    #[test]
    fn build_sums_per_bin_and_missing() {
        let (binned, grads) = setup();
        let layout = HistogramLayout::new(&binned);
        let hist = Histogram::build(&layout, &binned, &grads, &[0, 1, 2, 3], &[0]);
        let bins = hist.feature_bins(&layout, 0);
        assert_eq!(bins.len(), 2);
        assert_abs_diff_eq!(bins[0].0, 1.0);
        assert_abs_diff_eq!(bins[1].0, 6.0);
        assert_abs_diff_eq!(bins[1].1, 2.0);
        assert_eq!(hist.missing(0), (3.0, 1.0));
    }

    #[test]
    fn subtraction_gives_sibling() {
        let (binned, grads) = setup();
        let layout = HistogramLayout::new(&binned);
        let parent = Histogram::build(&layout, &binned, &grads, &[0, 1, 2, 3], &[0]);
        let left = Histogram::build(&layout, &binned, &grads, &[0, 2], &[0]);
        let right = left.sibling_of(&parent);
        let direct = Histogram::build(&layout, &binned, &grads, &[1, 3], &[0]);
        assert_eq!(right.feature_bins(&layout, 0), direct.feature_bins(&layout, 0));
        assert_eq!(right.missing(0), direct.missing(0));
    }
}
