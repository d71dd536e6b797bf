// Proof steps. Each transformer turns one VC into a lazy sequence of alternative VCs,
// every one of which implies the original.
use std::collections::BTreeSet;
use std::fmt;

use crate::term::Term;
use crate::vc::VC;

pub mod combinators;
pub mod develop;
pub mod existential;
pub mod simplify;
pub mod substitute;
pub mod weaken;

pub use combinators::{NoBacktrack, Productive, Singleton};
pub use develop::{Accumulate, BatchDevelop, DevelopAntecedent, NewTermsOnly};
pub use existential::ExistentialInstantiation;
pub use simplify::{simplified, simplify_fully, Simplify};
pub use substitute::{
    ExpandAntecedentBySubstitution, ReplacementSuggester, Site, SubstituteInAntecedent,
    SubstituteInConsequent,
};
pub use weaken::ConsequentWeakening;

pub trait Transformer: fmt::Display {
    /// The alternatives, lazily. The input VC is never modified.
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a>;

    /// Identifies the rule in metrics.
    fn key(&self) -> String {
        self.to_string()
    }

    /// The term this rule looks for, if it is built from one.
    fn pattern(&self) -> Option<&Term> {
        None
    }

    /// The term this rule produces, if it is built from one.
    fn template(&self) -> Option<&Term> {
        None
    }

    /// Whether applying the rule can leave quantified variables that nothing bound.
    fn introduces_quantified_variables(&self) -> bool {
        false
    }

    /// How many function applications one application adds, negative when it removes some.
    fn function_application_delta(&self) -> i64 {
        0
    }

    fn pattern_symbol_names(&self) -> BTreeSet<String> {
        self.pattern()
            .map(|pattern| pattern.symbol_names())
            .unwrap_or_default()
    }

    fn replacement_symbol_names(&self) -> BTreeSet<String> {
        self.template()
            .map(|template| template.symbol_names())
            .unwrap_or_default()
    }

    fn could_affect_antecedent(&self) -> bool;

    fn could_affect_consequent(&self) -> bool;
}

/// Whether the template mentions a quantified variable the patterns never bind.
pub fn leaves_unbound(patterns: &[&Term], template: &Term) -> bool {
    let bound: BTreeSet<_> = patterns
        .iter()
        .flat_map(|pattern| pattern.quantified_variables())
        .collect();
    template
        .quantified_variables()
        .iter()
        .any(|var| !bound.contains(var))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    #[test]
    fn test_leaves_unbound() {
        let pattern = t("forall x. +(x, 0)");
        assert!(!leaves_unbound(&[&pattern], &t("forall x. x")));
        assert!(leaves_unbound(&[&pattern], &t("forall x, y. +(x, y)")));
        assert!(!leaves_unbound(&[], &t("a")));
    }
}
