use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsSummary;
use crate::proof::Proof;
use crate::theorem::NormalizerConfig;

mod search;

pub use search::{default_chooser, Prover};

/// How a proof search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Proved,

    /// The antecedent contradicts itself. That points at the program, not the prover.
    Inconsistent,

    Exhausted,
    Interrupted,
    Timeout,
}

impl Outcome {
    /// Whether the search gave up without an answer.
    pub fn is_unable(&self) -> bool {
        matches!(
            self,
            Outcome::Exhausted | Outcome::Interrupted | Outcome::Timeout
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Proved => write!(f, "Proved"),
            Outcome::Inconsistent => write!(f, "Inconsistent"),
            Outcome::Exhausted => write!(f, "Exhausted"),
            Outcome::Interrupted => write!(f, "Interrupted"),
            Outcome::Timeout => write!(f, "Timeout"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// No path gets longer than this many steps.
    pub max_depth: usize,

    /// Past this depth the search logs a warning, once. It keeps going.
    pub depth_warning: usize,

    /// Wall-clock budget for a single VC.
    pub timeout: Option<Duration>,

    /// Each state is simplified before anything else, from this depth on.
    pub simplify_min_depth: usize,

    /// Rules scoring below this are never suggested.
    pub fitness_threshold: f64,

    /// Use ground equalities from the VC's own antecedent as rewrite rules.
    pub local_theorems: bool,

    pub antecedent_expansion: bool,
    pub antecedent_rewriting: bool,
    pub consequent_weakening: bool,

    /// When nonzero, every path starts with this many rounds of antecedent development.
    pub develop_rounds: usize,

    /// From this depth on, every other ply is a forced simplification.
    pub interleave_from: Option<usize>,

    pub noisy: bool,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            max_depth: 8,
            depth_warning: 100,
            timeout: None,
            simplify_min_depth: 0,
            fitness_threshold: 0.0,
            local_theorems: true,
            antecedent_expansion: false,
            antecedent_rewriting: false,
            consequent_weakening: true,
            develop_rounds: 0,
            interleave_from: None,
            noisy: false,
        }
    }
}

impl ProverConfig {
    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            antecedent_expansion: self.antecedent_expansion,
            antecedent_rewriting: self.antecedent_rewriting,
            consequent_weakening: self.consequent_weakening,
            noisy: self.noisy,
        }
    }
}

/// Everything a caller learns from one proof attempt.
#[derive(Clone, Debug)]
pub struct ProofResult {
    pub outcome: Outcome,

    /// The steps taken, when the search reached a terminal answer.
    pub proof: Option<Proof>,

    pub metrics: MetricsSummary,
}

impl ProofResult {
    pub fn is_proved(&self) -> bool {
        self.outcome == Outcome::Proved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unable_outcomes() {
        assert!(!Outcome::Proved.is_unable());
        assert!(!Outcome::Inconsistent.is_unable());
        assert!(Outcome::Exhausted.is_unable());
        assert!(Outcome::Interrupted.is_unable());
        assert!(Outcome::Timeout.is_unable());
    }

    #[test]
    fn test_config_from_json() {
        let config: ProverConfig =
            serde_json::from_str(r#"{"max_depth": 3, "timeout": {"secs": 2, "nanos": 0}}"#)
                .unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.depth_warning, 100);
        assert!(config.consequent_weakening);
        assert!(config.normalizer_config().consequent_weakening);
    }
}
