use std::fmt;

use crate::transformer::Transformer;
use crate::vc::VC;

/// Drops obviously true conjuncts and duplicates on both sides, then every goal the
/// antecedent already states. None when nothing changes.
pub fn simplified(vc: &VC) -> Option<VC> {
    let antecedent = vc
        .antecedent()
        .eliminate_obviously_true()
        .eliminate_redundant();
    let consequent = vc
        .consequent()
        .eliminate_obviously_true()
        .eliminate_redundant()
        .retain(|goal| !antecedent.contains_equivalent(goal));

    // Simplification only ever removes conjuncts.
    if antecedent.len() == vc.antecedent().len() && consequent.len() == vc.consequent().len() {
        return None;
    }
    Some(vc.with_both(antecedent, consequent))
}

pub fn simplify_fully(vc: &VC) -> VC {
    simplified(vc).unwrap_or_else(|| vc.clone())
}

/// The deterministic simplification step. Yields a single VC, and only when it changed something.
pub struct Simplify;

impl fmt::Display for Simplify {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "simplify")
    }
}

impl Transformer for Simplify {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        Box::new(simplified(vc).into_iter())
    }

    fn function_application_delta(&self) -> i64 {
        -1
    }

    fn could_affect_antecedent(&self) -> bool {
        true
    }

    fn could_affect_consequent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn vc(antecedent: &str, consequent: &str) -> VC {
        VC::from_terms(
            "test",
            &Term::parse(antecedent).unwrap(),
            &Term::parse(consequent).unwrap(),
        )
    }

    #[test]
    fn test_true_consequent_simplifies_away() {
        let result = simplified(&vc("true", "true")).unwrap();
        assert!(result.is_proved());
        assert!(result.antecedent().is_empty());
    }

    #[test]
    fn test_symmetric_equality_is_obvious() {
        assert!(simplified(&vc("p", "=(a, a)")).unwrap().is_proved());
    }

    #[test]
    fn test_goals_in_antecedent_are_cancelled() {
        let result = simplified(&vc("and(p(a), forall x. q(x))", "and(forall y. q(y), r)")).unwrap();
        assert_eq!(result.consequent().to_string(), "r");
        assert_eq!(result.antecedent().len(), 2);
    }

    #[test]
    fn test_unchanged_vc_yields_nothing() {
        let plain = vc("p(a)", "q(a)");
        assert!(simplified(&plain).is_none());
        assert_eq!(Simplify.transform(&plain).count(), 0);
        assert_eq!(simplify_fully(&plain), plain);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let result = simplified(&vc("and(p, p)", "and(q, q)")).unwrap();
        assert_eq!(result.antecedent().to_string(), "p");
        assert_eq!(result.consequent().to_string(), "q");
    }
}
