//! Quantized feature data for histogram-based training.
//!
//! Each feature gets a [`BinMapper`] holding ascending cut points. A value
//! `x` falls into bin `b` = number of cuts `<= x`, so "bins `0..=b` go left"
//! is exactly the raw split `x < cuts[b]`. Trained trees can therefore store
//! `cuts[b]` as their threshold and predict on raw features.

use ndarray::ArrayView2;

/// Bin index reserved for missing (NaN) values.
pub const MISSING_BIN: u16 = u16::MAX;

/// Default upper bound on bins per feature.
pub const DEFAULT_MAX_BINS: usize = 256;

/// Cut points for one numeric feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BinMapper {
    cuts: Vec<f32>,
}

impl BinMapper {
    /// Compute cuts from a feature column.
    ///
    /// With at most `max_bins` distinct finite values every value gets its own
    /// bin. Otherwise cuts are exact quantiles of the sorted values.
    pub fn from_values(values: impl IntoIterator<Item = f32>, max_bins: usize) -> Self {
        let max_bins = max_bins.max(2);
        let mut sorted: Vec<f32> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f32::total_cmp);

        let mut unique = sorted.clone();
        unique.dedup();

        if unique.len() <= max_bins {
            return Self {
                cuts: unique.into_iter().skip(1).collect(),
            };
        }

        let n = sorted.len();
        let min = sorted[0];
        let mut cuts: Vec<f32> = Vec::with_capacity(max_bins);
        for i in 1..max_bins {
            let q = i as f64 / max_bins as f64;
            let idx = ((q * (n - 1) as f64).round() as usize).min(n - 1);
            let cut = sorted[idx];
            if cut > min && cuts.last().is_none_or(|&last| cut > last) {
                cuts.push(cut);
            }
        }
        Self { cuts }
    }

    /// Ascending cut points.
    pub fn cuts(&self) -> &[f32] {
        &self.cuts
    }

    /// Number of non-missing bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.cuts.len() + 1
    }

    /// Bin for a raw value.
    #[inline]
    pub fn bin(&self, value: f32) -> u16 {
        if value.is_nan() {
            MISSING_BIN
        } else {
            self.cuts.partition_point(|&c| c <= value) as u16
        }
    }

    /// Raw threshold equivalent to sending bins `0..=bin` left.
    #[inline]
    pub fn threshold(&self, bin: usize) -> f32 {
        self.cuts[bin]
    }
}

/// Feature-major matrix of bin indices.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    bins: Vec<u16>,
    mappers: Vec<BinMapper>,
    n_rows: usize,
}

impl BinnedMatrix {
    /// Quantize a `[n_rows, n_features]` matrix.
    pub fn from_features(features: ArrayView2<f32>, max_bins: usize) -> Self {
        let n_rows = features.nrows();
        let mut bins = Vec::with_capacity(n_rows * features.ncols());
        let mut mappers = Vec::with_capacity(features.ncols());

        for column in features.columns() {
            let mapper = BinMapper::from_values(column.iter().copied(), max_bins);
            bins.extend(column.iter().map(|&v| mapper.bin(v)));
            mappers.push(mapper);
        }

        Self {
            bins,
            mappers,
            n_rows,
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.mappers.len()
    }

    pub fn mapper(&self, feature: usize) -> &BinMapper {
        &self.mappers[feature]
    }

    /// Bins of one feature across all rows.
    #[inline]
    pub fn feature_bins(&self, feature: usize) -> &[u16] {
        &self.bins[feature * self.n_rows..(feature + 1) * self.n_rows]
    }
}
