use std::fmt;
use std::rc::Rc;

use crate::binder::{global_facts, Fact, IncrementalBinder};
use crate::binding::Binding;
use crate::term::{Quantification, Term};
use crate::transformer::Transformer;
use crate::vc::VC;

/// Establishes a goal that contains an existential by finding a witness among the facts.
/// The goal is dropped and the witness is substituted into the goals that remain.
pub struct ExistentialInstantiation {
    globals: Rc<[Term]>,
}

impl ExistentialInstantiation {
    pub fn new(globals: Rc<[Term]>) -> ExistentialInstantiation {
        ExistentialInstantiation { globals }
    }
}

// A universally quantified goal is only established by a fact that is just as general.
fn respects_universals(binding: &Binding) -> bool {
    binding.iter().all(|(var, term)| {
        var.quantification != Quantification::ForAll
            || term.quantification() == Quantification::ForAll
    })
}

impl fmt::Display for ExistentialInstantiation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "existential instantiation")
    }
}

impl Transformer for ExistentialInstantiation {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let mut facts = vc.antecedent().facts();
        facts.extend(global_facts(&self.globals));
        let pool: Rc<[Fact<'a>]> = facts.into();
        let consequent = vc.consequent();

        Box::new(
            consequent
                .iter()
                .enumerate()
                .filter(|(_, goal)| goal.contains_existential())
                .flat_map(move |(index, goal)| {
                    let pool = pool.clone();
                    let candidates = (0..pool.len()).map(move |i| pool[i]);
                    IncrementalBinder::new(goal, candidates, Binding::new())
                        .filter(|m| respects_universals(&m.binding))
                        .map(move |m| {
                            let remaining = consequent.remove(index).substitute(&m.binding);
                            vc.with_consequent(remaining)
                        })
                }),
        )
    }

    fn function_application_delta(&self) -> i64 {
        -2
    }

    fn could_affect_antecedent(&self) -> bool {
        false
    }

    fn could_affect_consequent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    fn vc(antecedent: &str, consequent: &str) -> VC {
        VC::from_terms("test", &t(antecedent), &t(consequent))
    }

    fn none() -> Rc<[Term]> {
        Vec::new().into()
    }

    #[test]
    fn test_witness_from_antecedent() {
        let step = ExistentialInstantiation::new(none());
        let input = vc("and(<(0, n), p(n))", "exists y. and(<(0, y), p(y))");
        let results: Vec<String> = step
            .transform(&input)
            .map(|v| v.consequent().to_string())
            .collect();
        // Either goal can pick the witness, which then carries over to the other.
        assert_eq!(results, vec!["p(n)", "<(0, n)"]);
    }

    #[test]
    fn test_witness_from_global_fact() {
        let step = ExistentialInstantiation::new(vec![t("even(zero)")].into());
        let results: Vec<VC> = step.transform(&vc("true", "exists y. even(y)")).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_proved());
    }

    #[test]
    fn test_goals_without_existentials_are_left_alone() {
        let step = ExistentialInstantiation::new(none());
        assert_eq!(step.transform(&vc("p(a)", "p(a)")).count(), 0);
    }

    #[test]
    fn test_universal_goal_needs_universal_fact() {
        let step = ExistentialInstantiation::new(none());
        let input = vc("r(a, b)", "forall x. exists y. r(x, y)");
        assert_eq!(step.transform(&input).count(), 0);
        let general = vc("forall z. r(z, b)", "forall x. exists y. r(x, y)");
        assert_eq!(step.transform(&general).count(), 1);
    }
}
