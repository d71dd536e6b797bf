use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// How far the top level of a search has come.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        100.0 * self.completed as f64 / self.total as f64
    }
}

/// Counters for one proof attempt, plus the handles a caller uses to watch or stop it.
/// This is the only mutable state a search carries.
#[derive(Default)]
pub struct Metrics {
    /// VC states the search has visited.
    pub proofs_considered: u64,

    /// Branches abandoned because they led back to a VC already on the path.
    pub backtracks: u64,

    /// Transformer applications, across all rules.
    pub rule_tries: u64,

    pub max_depth_reached: usize,

    rule_tries_by_key: HashMap<String, u64>,

    cancellation: CancellationToken,

    progress: Option<Box<dyn FnMut(Progress)>>,
}

impl Metrics {
    pub fn new() -> Metrics {
        Metrics::default()
    }

    /// Shares a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Metrics {
        self.cancellation = token;
        self
    }

    pub fn with_progress(mut self, callback: impl FnMut(Progress) + 'static) -> Metrics {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn record_try(&mut self, key: &str) {
        self.rule_tries += 1;
        *self.rule_tries_by_key.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn tries_for(&self, key: &str) -> u64 {
        self.rule_tries_by_key.get(key).copied().unwrap_or(0)
    }

    pub fn record_depth(&mut self, depth: usize) {
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    pub fn report_progress(&mut self, progress: Progress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(progress);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            proofs_considered: self.proofs_considered,
            backtracks: self.backtracks,
            rule_tries: self.rule_tries,
            max_depth_reached: self.max_depth_reached,
            rule_tries_by_key: self
                .rule_tries_by_key
                .iter()
                .map(|(key, count)| (key.clone(), *count))
                .collect(),
        }
    }
}

/// A snapshot of the counters, detached from the live search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSummary {
    pub proofs_considered: u64,
    pub backtracks: u64,
    pub rule_tries: u64,
    pub max_depth_reached: usize,
    pub rule_tries_by_key: BTreeMap<String, u64>,
}

/// The deadline and cancellation token of the attempt in progress.
/// Clones share state, so a step built once can be armed anew for every attempt.
/// An unarmed interrupt never fires.
#[derive(Clone, Default)]
pub struct Interrupt {
    deadline: Rc<Cell<Option<Instant>>>,
    cancellation: Rc<RefCell<CancellationToken>>,
}

impl Interrupt {
    pub fn new() -> Interrupt {
        Interrupt::default()
    }

    pub fn arm(&self, deadline: Option<Instant>, cancellation: CancellationToken) {
        self.deadline.set(deadline);
        *self.cancellation.borrow_mut() = cancellation;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.get()
    }

    pub fn is_expired(&self) -> bool {
        match self.deadline.get() {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.borrow().is_cancelled()
    }

    pub fn is_triggered(&self) -> bool {
        self.is_expired() || self.is_cancelled()
    }
}
