//! Split gain and leaf weight computation.

/// Regularization parameters entering the gain formula.
#[derive(Debug, Clone, PartialEq)]
pub struct GainParams {
    /// L2 regularization on leaf weights (λ).
    pub reg_lambda: f32,
    /// L1 regularization on leaf weights (α).
    pub reg_alpha: f32,
    /// Minimum gain required to split (γ).
    pub min_gain: f32,
    /// Minimum hessian sum in each child.
    pub min_child_weight: f32,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            min_gain: 0.0,
            min_child_weight: 1.0,
        }
    }
}

impl GainParams {
    /// Soft-threshold the gradient sum by α.
    #[inline]
    fn threshold_grad(&self, sum_grad: f64) -> f64 {
        let alpha = self.reg_alpha as f64;
        if sum_grad > alpha {
            sum_grad - alpha
        } else if sum_grad < -alpha {
            sum_grad + alpha
        } else {
            0.0
        }
    }

    /// Structure score `T(G)² / (H + λ)` of a node.
    #[inline]
    pub fn node_score(&self, sum_grad: f64, sum_hess: f64) -> f64 {
        let g = self.threshold_grad(sum_grad);
        g * g / (sum_hess + self.reg_lambda as f64)
    }

    /// `½[score(L) + score(R) - score(P)] - γ`.
    #[inline]
    pub fn compute_gain(&self, grad_left: f64, hess_left: f64, grad_right: f64, hess_right: f64) -> f64 {
        let parent = self.node_score(grad_left + grad_right, hess_left + hess_right);
        let left = self.node_score(grad_left, hess_left);
        let right = self.node_score(grad_right, hess_right);
        0.5 * (left + right - parent) - self.min_gain as f64
    }

    /// Both children carry enough hessian mass.
    #[inline]
    pub fn is_valid_split(&self, hess_left: f64, hess_right: f64) -> bool {
        let mcw = self.min_child_weight as f64;
        hess_left >= mcw && hess_right >= mcw
    }

    /// Optimal leaf weight `-T(G) / (H + λ)` (before learning-rate scaling).
    #[inline]
    pub fn compute_leaf_weight(&self, sum_grad: f64, sum_hess: f64) -> f64 {
        let denom = sum_hess + self.reg_lambda as f64;
        if denom <= 0.0 {
            return 0.0;
        }
        -self.threshold_grad(sum_grad) / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gain_matches_formula() {
        let params = GainParams {
            reg_lambda: 1.0,
            min_gain: 0.1,
            ..Default::default()
        };
        // GL=-4, HL=3, GR=4, HR=3, parent G=0, H=6
        let gain = params.compute_gain(-4.0, 3.0, 4.0, 3.0);
        assert_abs_diff_eq!(gain, 0.5 * (16.0 / 4.0 + 16.0 / 4.0) - params.min_gain as f64, epsilon = 1e-12);
        assert_abs_diff_eq!(gain, 3.9, epsilon = 1e-6);
    }

    #[test]
    fn leaf_weight_with_l1_soft_threshold() {
        let params = GainParams {
            reg_lambda: 1.0,
            reg_alpha: 1.0,
            ..Default::default()
        };
        assert_abs_diff_eq!(params.compute_leaf_weight(-5.0, 3.0), 1.0);
        assert_abs_diff_eq!(params.compute_leaf_weight(5.0, 3.0), -1.0);
        assert_abs_diff_eq!(params.compute_leaf_weight(0.5, 3.0), 0.0);
    }

    #[test]
    fn min_child_weight_guards_splits() {
        let params = GainParams {
            min_child_weight: 2.0,
            ..Default::default()
        };
        assert!(params.is_valid_split(2.0, 5.0));
        assert!(!params.is_valid_split(1.5, 5.0));
    }
}
