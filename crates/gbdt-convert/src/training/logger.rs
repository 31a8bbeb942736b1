//! Training progress logging.
//!
//! [`TrainingLogger`] turns training milestones into `tracing` events, gated
//! by the configured [`Verbosity`]. Whether the events are printed is up to
//! the installed subscriber.

use serde::{Deserialize, Serialize};

/// How much the trainer reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verbosity {
    /// No training output.
    #[default]
    Silent,
    /// Only warnings (e.g. a round that produced no split).
    Warning,
    /// Start/finish summaries and per-round metrics.
    Info,
    /// Per-tree details.
    Debug,
}

/// Emits training events at the configured verbosity.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    n_rounds: usize,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            n_rounds: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn start_training(&mut self, n_rounds: usize, n_rows: usize, n_features: usize) {
        self.n_rounds = n_rounds;
        if self.verbosity >= Verbosity::Info {
            tracing::info!(n_rounds, n_rows, n_features, "training started");
        }
    }

    /// Log one round's metric value.
    pub fn log_metrics(&self, round: usize, metric: &str, value: f64) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(round, total = self.n_rounds, metric, value, "round finished");
        }
    }

    pub fn log_tree(&self, round: usize, n_nodes: usize, depth: usize) {
        if self.verbosity >= Verbosity::Debug {
            tracing::debug!(round, n_nodes, depth, "tree grown");
        }
    }

    /// A round whose tree could not split at the root.
    pub fn warn_stump(&self, round: usize) {
        if self.verbosity >= Verbosity::Warning {
            tracing::warn!(round, "no split improved the loss; tree is a single leaf");
        }
    }

    pub fn finish_training(&self, n_trees: usize) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(n_trees, "training finished");
        }
    }
}
