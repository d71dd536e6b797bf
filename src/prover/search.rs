use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::chooser::{
    Chooser, Concatenation, CycleDetector, DepthTether, FitnessSorted, FixedFirstStep,
    ListChooser, ProofData, SimplifyInterleave, Suggestion, TokenSource,
};
use crate::fitness::DefaultFitness;
use crate::metrics::{Interrupt, Metrics, Progress};
use crate::proof::{Proof, ProofStep};
use crate::prover::{Outcome, ProofResult, ProverConfig};
use crate::theorem::RuleLibrary;
use crate::transformer::{
    simplify_fully, BatchDevelop, ExistentialInstantiation, NewTermsOnly, Productive, Singleton,
    Transformer,
};
use crate::vc::VC;

/// The strategy used unless the caller brings their own.
/// Ranked library rules, then existential instantiation, under depth and cycle guards.
/// Library rules only offer alternatives that still differ from the VC after simplification.
/// Batch development polls the interrupt, which the prover arms for each attempt.
pub fn default_chooser(
    config: &ProverConfig,
    library: &RuleLibrary,
    interrupt: &Interrupt,
) -> Box<dyn Chooser> {
    let rules: Vec<Rc<dyn Transformer>> = library
        .transformers()
        .iter()
        .map(|rule| Rc::new(Productive::new(rule.clone())) as Rc<dyn Transformer>)
        .collect();
    let ranked = FitnessSorted::new(
        rules,
        Box::new(DefaultFitness::default()),
        config.fitness_threshold,
    )
    .with_local_theorems(config.local_theorems);
    let instantiate: Rc<dyn Transformer> =
        Rc::new(ExistentialInstantiation::new(library.global_facts().clone()));
    let mut chooser: Box<dyn Chooser> = Box::new(Concatenation::new(vec![
        Box::new(ranked),
        Box::new(ListChooser::new(vec![instantiate])),
    ]));

    if let Some(min_depth) = config.interleave_from {
        chooser = Box::new(SimplifyInterleave::new(chooser, min_depth));
    }

    if config.develop_rounds > 0 {
        let developers: Vec<Rc<dyn Transformer>> = library
            .developers()
            .into_iter()
            .map(|rule| Rc::new(NewTermsOnly::new(rule)) as Rc<dyn Transformer>)
            .collect();
        let batch = Rc::new(Singleton::new(Rc::new(
            BatchDevelop::new(developers, config.develop_rounds)
                .with_interrupt(interrupt.clone()),
        )));
        let mut tokens = TokenSource::new();
        chooser = Box::new(FixedFirstStep::new(batch, chooser, tokens.issue()));
    }

    Box::new(CycleDetector::new(Box::new(DepthTether::new(
        chooser,
        config.max_depth,
    ))))
}

pub struct Prover {
    config: ProverConfig,
    chooser: Box<dyn Chooser>,

    // Shared with whatever in the chooser needs to stop early.
    interrupt: Interrupt,
}

impl Prover {
    pub fn new(config: ProverConfig, library: &RuleLibrary) -> Prover {
        let interrupt = Interrupt::new();
        let chooser = default_chooser(&config, library, &interrupt);
        Prover {
            config,
            chooser,
            interrupt,
        }
    }

    pub fn with_chooser(config: ProverConfig, chooser: Box<dyn Chooser>) -> Prover {
        Prover {
            config,
            chooser,
            interrupt: Interrupt::new(),
        }
    }

    /// Uses an interrupt the caller already handed to steps inside a custom chooser.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Prover {
        self.interrupt = interrupt;
        self
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    pub fn prove(&mut self, vc: &VC) -> ProofResult {
        let mut metrics = Metrics::new();
        self.prove_with(vc, &mut metrics)
    }

    /// Searches using caller-supplied metrics, so the caller can watch progress or cancel.
    pub fn prove_with(&mut self, vc: &VC, metrics: &mut Metrics) -> ProofResult {
        self.chooser.preoptimize(vc);
        let start = Instant::now();
        self.interrupt.arm(
            self.config.timeout.map(|timeout| start + timeout),
            metrics.cancellation_token(),
        );
        let mut search = Search {
            config: &self.config,
            chooser: self.chooser.as_ref(),
            interrupt: &self.interrupt,
            warned: false,
            steps: vec![],
        };

        let outcome = match search.explore(vc, 0, metrics, &ProofData::new()) {
            ControlFlow::Break(outcome) => outcome,
            // A step that stopped early yields nothing, so the search can run dry after an interrupt.
            ControlFlow::Continue(()) => search.interruption().unwrap_or(Outcome::Exhausted),
        };
        debug!(
            vc = %vc.name(),
            outcome = %outcome,
            proofs_considered = metrics.proofs_considered,
            backtracks = metrics.backtracks,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search finished"
        );

        let proof = match outcome {
            Outcome::Proved | Outcome::Inconsistent => {
                // Steps were pushed while unwinding, deepest first.
                let mut steps = search.steps;
                steps.reverse();
                Some(Proof::new(vc.clone(), steps))
            }
            _ => None,
        };
        ProofResult {
            outcome,
            proof,
            metrics: metrics.summary(),
        }
    }
}

/// The state of one proof attempt.
/// Continue means a branch was exhausted. Break carries a terminal outcome to the root.
struct Search<'p> {
    config: &'p ProverConfig,
    chooser: &'p dyn Chooser,
    interrupt: &'p Interrupt,

    // The depth warning is only logged once per attempt.
    warned: bool,

    steps: Vec<ProofStep>,
}

impl<'p> Search<'p> {
    fn interruption(&self) -> Option<Outcome> {
        if self.interrupt.is_cancelled() {
            return Some(Outcome::Interrupted);
        }
        if self.interrupt.is_expired() {
            return Some(Outcome::Timeout);
        }
        None
    }

    fn explore(
        &mut self,
        vc: &VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> ControlFlow<Outcome> {
        // Cancellation waits until the state has been checked, so a VC that is already proved stays proved.
        if self.interrupt.is_expired() {
            return ControlFlow::Break(Outcome::Timeout);
        }
        metrics.proofs_considered += 1;
        metrics.record_depth(depth);

        let simplified;
        let vc = if depth >= self.config.simplify_min_depth {
            simplified = simplify_fully(vc);
            &simplified
        } else {
            vc
        };

        if vc.is_proved() {
            trace!(depth, vc = %vc.name(), "proved");
            return ControlFlow::Break(Outcome::Proved);
        }
        if vc.is_inconsistent() {
            debug!(depth, vc = %vc.name(), "antecedent is inconsistent");
            return ControlFlow::Break(Outcome::Inconsistent);
        }
        if self.interrupt.is_cancelled() {
            return ControlFlow::Break(Outcome::Interrupted);
        }
        if depth > self.config.depth_warning && !self.warned {
            warn!(depth, vc = %vc.name(), "search is suspiciously deep");
            self.warned = true;
        }

        let chooser: &'p dyn Chooser = self.chooser;
        let suggestions = chooser.suggest(vc, depth, metrics, data);
        if depth > 0 {
            for suggestion in suggestions {
                self.attempt(vc, suggestion, depth, metrics)?;
            }
            return ControlFlow::Continue(());
        }

        // At the top level we need the total to report progress.
        let suggestions: Vec<Suggestion> = suggestions.collect();
        let total = suggestions.len();
        for (i, suggestion) in suggestions.into_iter().enumerate() {
            self.attempt(vc, suggestion, depth, metrics)?;
            metrics.report_progress(Progress {
                completed: i + 1,
                total,
            });
        }
        ControlFlow::Continue(())
    }

    /// Explores every alternative one suggested step produces.
    fn attempt(
        &mut self,
        vc: &VC,
        suggestion: Suggestion,
        depth: usize,
        metrics: &mut Metrics,
    ) -> ControlFlow<Outcome> {
        if let Some(outcome) = self.interruption() {
            return ControlFlow::Break(outcome);
        }
        let transformer = suggestion.transformer.clone();
        metrics.record_try(&transformer.key());
        trace!(depth, step = %suggestion, "trying");

        for candidate in transformer.transform(vc) {
            if let ControlFlow::Break(outcome) =
                self.explore(&candidate, depth + 1, metrics, &suggestion.data)
            {
                if matches!(outcome, Outcome::Proved | Outcome::Inconsistent) {
                    self.steps.push(ProofStep {
                        description: transformer.to_string(),
                        notes: suggestion.notes.clone(),
                        vc: candidate,
                    });
                }
                return ControlFlow::Break(outcome);
            }
        }
        ControlFlow::Continue(())
    }
}
