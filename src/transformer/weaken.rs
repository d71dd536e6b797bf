use std::collections::BTreeSet;
use std::fmt;

use crate::binder::ConjunctBinder;
use crate::binding::Binding;
use crate::conjuncts::Consequent;
use crate::term::Term;
use crate::transformer::{leaves_unbound, Transformer};
use crate::vc::VC;

/// Works backwards through an implication H implies C1 and ... and Cm.
/// When the Ci match distinct goals, those goals are replaced by H under the binding and
/// the other goals stay.
pub struct ConsequentWeakening {
    source: String,
    hypothesis: Term,
    conclusions: Vec<Term>,
    conclusion_term: Term,
}

impl ConsequentWeakening {
    pub fn new(source: &str, hypothesis: Term, conclusion: &Term) -> ConsequentWeakening {
        ConsequentWeakening {
            source: source.to_string(),
            hypothesis,
            conclusions: conclusion.split_into_conjuncts(),
            conclusion_term: conclusion.clone(),
        }
    }
}

impl fmt::Display for ConsequentWeakening {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "weaken consequent {}: {} <= {}",
            self.source, self.conclusion_term, self.hypothesis
        )
    }
}

impl Transformer for ConsequentWeakening {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let consequent = vc.consequent();
        Box::new(
            ConjunctBinder::new(&self.conclusions, consequent, Binding::new())
                .filter(move |m| m.binding.covers(&self.hypothesis))
                .map(move |m| {
                    let hypothesis = self.hypothesis.substitute(&m.binding);
                    let weakened: Consequent = m
                        .remaining
                        .iter()
                        .filter_map(|&i| consequent.get(i).cloned())
                        .chain(std::iter::once(hypothesis))
                        .collect();
                    vc.with_consequent(weakened)
                }),
        )
    }

    fn pattern(&self) -> Option<&Term> {
        Some(&self.conclusion_term)
    }

    fn template(&self) -> Option<&Term> {
        Some(&self.hypothesis)
    }

    fn pattern_symbol_names(&self) -> BTreeSet<String> {
        self.conclusions
            .iter()
            .flat_map(|conclusion| conclusion.symbol_names())
            .collect()
    }

    fn introduces_quantified_variables(&self) -> bool {
        let conclusions: Vec<&Term> = self.conclusions.iter().collect();
        leaves_unbound(&conclusions, &self.hypothesis)
    }

    fn function_application_delta(&self) -> i64 {
        self.hypothesis.function_application_count() as i64
            - self.conclusion_term.function_application_count() as i64
    }

    fn could_affect_antecedent(&self) -> bool {
        false
    }

    fn could_affect_consequent(&self) -> bool {
        true
    }
}
