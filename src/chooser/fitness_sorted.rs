use std::rc::Rc;

use tracing::trace;

use crate::chooser::{Chooser, ProofData, Suggestion};
use crate::fitness::FitnessFunction;
use crate::metrics::Metrics;
use crate::transformer::{SubstituteInConsequent, Transformer};
use crate::vc::VC;

/// Ranks a rule library against each VC, best first, dropping rules below the threshold.
/// Ground equalities in the VC's own antecedent become extra substitution steps, tried last.
pub struct FitnessSorted {
    library: Vec<Rc<dyn Transformer>>,
    fitness: Box<dyn FitnessFunction>,
    threshold: f64,
    local_theorems: bool,
}

impl FitnessSorted {
    pub fn new(
        library: Vec<Rc<dyn Transformer>>,
        fitness: Box<dyn FitnessFunction>,
        threshold: f64,
    ) -> FitnessSorted {
        FitnessSorted {
            library,
            fitness,
            threshold,
            local_theorems: true,
        }
    }

    pub fn with_local_theorems(mut self, local_theorems: bool) -> FitnessSorted {
        self.local_theorems = local_theorems;
        self
    }
}

/// Substitutions in both directions for every ground equality the antecedent states.
pub fn local_substitutions(vc: &VC) -> Vec<Rc<dyn Transformer>> {
    let mut answer: Vec<Rc<dyn Transformer>> = vec![];
    for fact in vc.antecedent().iter() {
        if !fact.is_equality() || fact.has_quantified() || fact.is_obviously_true() {
            continue;
        }
        let (left, right) = (fact.arg(0), fact.arg(1));
        answer.push(Rc::new(SubstituteInConsequent::new(
            "local",
            left.clone(),
            right.clone(),
        )));
        answer.push(Rc::new(SubstituteInConsequent::new(
            "local",
            right.clone(),
            left.clone(),
        )));
    }
    answer
}

impl Chooser for FitnessSorted {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        _metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        let mut scored: Vec<(f64, &Rc<dyn Transformer>)> = self
            .library
            .iter()
            .map(|rule| (self.fitness.score(rule.as_ref(), vc), rule))
            .filter(|(score, _)| *score >= self.threshold)
            .collect();
        // Stable, so ties keep the preoptimized order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        trace!(
            depth,
            kept = scored.len(),
            library = self.library.len(),
            "ranked rules"
        );

        let locals = if self.local_theorems {
            local_substitutions(vc)
        } else {
            vec![]
        };
        let data = data.clone();
        let local_data = data.clone();
        Box::new(
            scored
                .into_iter()
                .map(move |(score, rule)| {
                    Suggestion::new(rule.clone(), data.clone())
                        .with_note(format!("fitness {:.2}", score))
                })
                .chain(locals.into_iter().map(move |rule| {
                    Suggestion::new(rule, local_data.clone()).with_note("local theorem")
                })),
        )
    }

    fn preoptimize(&mut self, vc: &VC) {
        let fitness = &self.fitness;
        let mut ranked: Vec<(f64, Rc<dyn Transformer>)> = self
            .library
            .drain(..)
            .map(|rule| (fitness.score(rule.as_ref(), vc), rule))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.library = ranked.into_iter().map(|(_, rule)| rule).collect();
    }
}
