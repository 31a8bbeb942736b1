//! Gradient storage.

/// First and second derivative of the loss for one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GradsTuple {
    pub grad: f32,
    pub hess: f32,
}

/// Per-row gradient pairs for a single-output model.
#[derive(Debug, Clone)]
pub struct Gradients {
    pairs: Vec<GradsTuple>,
}

impl Gradients {
    pub fn new(n_rows: usize) -> Self {
        Self {
            pairs: vec![GradsTuple::default(); n_rows],
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn pairs(&self) -> &[GradsTuple] {
        &self.pairs
    }

    #[inline]
    pub fn pairs_mut(&mut self) -> &mut [GradsTuple] {
        &mut self.pairs
    }

    /// `(sum_grad, sum_hess)` over the given rows, accumulated in f64.
    pub fn sum_rows(&self, rows: &[u32]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &r| {
            let p = self.pairs[r as usize];
            (g + p.grad as f64, h + p.hess as f64)
        })
    }
}
