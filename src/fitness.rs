use std::collections::BTreeSet;

use crate::transformer::Transformer;
use crate::vc::VC;

/// Scores how promising a transformer is for a VC, from -1 to 1.
/// A negative score means it is not worth trying.
pub trait FitnessFunction {
    fn score(&self, transformer: &dyn Transformer, vc: &VC) -> f64;
}

// The fraction of the names that are available. No names at all is neutral.
fn overlap(names: &BTreeSet<String>, available: &BTreeSet<String>) -> f64 {
    if names.is_empty() {
        return 0.5;
    }
    let present = names.iter().filter(|name| available.contains(*name)).count();
    present as f64 / names.len() as f64
}

/// Relevance: how many of the symbols a rule looks for are present where it would look.
/// Rules that work on the antecedent are also judged by how much their result has to do
/// with the goals.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolOverlapFitness;

impl FitnessFunction for SymbolOverlapFitness {
    fn score(&self, transformer: &dyn Transformer, vc: &VC) -> f64 {
        let goals = vc.consequent().symbol_names();
        let consequent_relevance = overlap(&transformer.pattern_symbol_names(), &goals);
        let antecedent_relevance = (overlap(
            &transformer.pattern_symbol_names(),
            &vc.antecedent().symbol_names(),
        ) + overlap(&transformer.replacement_symbol_names(), &goals))
            / 2.0;

        match (
            transformer.could_affect_antecedent(),
            transformer.could_affect_consequent(),
        ) {
            (false, true) => consequent_relevance,
            (true, false) => antecedent_relevance,
            _ => consequent_relevance.max(antecedent_relevance),
        }
    }
}

/// Rewards rules that shrink the VC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimplificationFitness;

impl FitnessFunction for SimplificationFitness {
    fn score(&self, transformer: &dyn Transformer, _vc: &VC) -> f64 {
        let delta = transformer.function_application_delta().clamp(-3, 3);
        -(delta as f64) / 3.0
    }
}

/// Relevance and simplification, averaged. Rules that leave quantified variables unbound,
/// and rules with nothing in common with the VC, are never worth trying.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultFitness {
    relevance: SymbolOverlapFitness,
    simplification: SimplificationFitness,
}

impl FitnessFunction for DefaultFitness {
    fn score(&self, transformer: &dyn Transformer, vc: &VC) -> f64 {
        if transformer.introduces_quantified_variables() {
            return -1.0;
        }
        let relevance = self.relevance.score(transformer, vc);
        if relevance <= 0.0 {
            return -1.0;
        }
        (relevance + self.simplification.score(transformer, vc)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;
    use crate::transformer::{DevelopAntecedent, SubstituteInConsequent};

    fn t(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    fn vc(antecedent: &str, consequent: &str) -> VC {
        VC::from_terms("test", &t(antecedent), &t(consequent))
    }

    #[test]
    fn test_relevant_simplifying_rule_scores_high() {
        let rule = SubstituteInConsequent::new("zero", t("forall x. +(x, 0)"), t("forall x. x"));
        let target = vc("true", "=(+(a, 0), a)");
        assert_eq!(SymbolOverlapFitness.score(&rule, &target), 1.0);
        let score = DefaultFitness::default().score(&rule, &target);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_irrelevant_rule_scores_negative() {
        let rule = SubstituteInConsequent::new("times", t("forall x. *(x, 1)"), t("forall x. x"));
        let target = vc("true", "=(+(a, 0), a)");
        assert!(DefaultFitness::default().score(&rule, &target) < 0.0);
    }

    #[test]
    fn test_unbound_variables_score_minus_one() {
        let rule = SubstituteInConsequent::new("z", t("zero"), t("forall x. -(x, x)"));
        let target = vc("true", "=(zero, zero)");
        assert_eq!(DefaultFitness::default().score(&rule, &target), -1.0);
    }

    #[test]
    fn test_growing_rules_are_penalized() {
        let rule = SubstituteInConsequent::new("grow", t("a"), t("f(g(h(i(a))))"));
        assert_eq!(SimplificationFitness.score(&rule, &vc("true", "p(a)")), -1.0);
    }

    #[test]
    fn test_developer_relevance_uses_both_sides() {
        let rule = DevelopAntecedent::new(
            "rule",
            vec![t("forall x. p(x)")],
            t("forall x. q(x)"),
            Vec::new().into(),
        );
        assert_eq!(SymbolOverlapFitness.score(&rule, &vc("p(a)", "q(a)")), 1.0);
        assert_eq!(SymbolOverlapFitness.score(&rule, &vc("p(a)", "r(a)")), 0.5);
        assert_eq!(SymbolOverlapFitness.score(&rule, &vc("s(a)", "r(a)")), 0.0);
    }
}
