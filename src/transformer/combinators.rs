use std::fmt;
use std::rc::Rc;

use tracing::error;

use crate::term::Term;
use crate::transformer::{simplify_fully, Transformer};
use crate::vc::VC;

// Every wrapper here describes the rule it wraps to the fitness functions.
macro_rules! delegate_rule_properties {
    () => {
        fn key(&self) -> String {
            self.inner.key()
        }

        fn pattern(&self) -> Option<&Term> {
            self.inner.pattern()
        }

        fn template(&self) -> Option<&Term> {
            self.inner.template()
        }

        fn introduces_quantified_variables(&self) -> bool {
            self.inner.introduces_quantified_variables()
        }

        fn function_application_delta(&self) -> i64 {
            self.inner.function_application_delta()
        }

        fn could_affect_antecedent(&self) -> bool {
            self.inner.could_affect_antecedent()
        }

        fn could_affect_consequent(&self) -> bool {
            self.inner.could_affect_consequent()
        }

        fn pattern_symbol_names(&self) -> std::collections::BTreeSet<String> {
            self.inner.pattern_symbol_names()
        }

        fn replacement_symbol_names(&self) -> std::collections::BTreeSet<String> {
            self.inner.replacement_symbol_names()
        }
    };
}

pub(crate) use delegate_rule_properties;

/// Discards alternatives that simplify to the same thing the input does.
pub struct Productive {
    inner: Rc<dyn Transformer>,
}

impl Productive {
    pub fn new(inner: Rc<dyn Transformer>) -> Productive {
        Productive { inner }
    }
}

impl fmt::Display for Productive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Transformer for Productive {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let before = simplify_fully(vc);
        Box::new(
            self.inner
                .transform(vc)
                .filter(move |alternative| !simplify_fully(alternative).equivalent(&before)),
        )
    }

    delegate_rule_properties!();
}

/// Commits to the first alternative that actually changes the VC.
pub struct NoBacktrack {
    inner: Rc<dyn Transformer>,
}

impl NoBacktrack {
    pub fn new(inner: Rc<dyn Transformer>) -> NoBacktrack {
        NoBacktrack { inner }
    }
}

impl fmt::Display for NoBacktrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Transformer for NoBacktrack {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        Box::new(
            self.inner
                .transform(vc)
                .filter(move |alternative| !alternative.equivalent(vc))
                .take(1),
        )
    }

    delegate_rule_properties!();
}

/// Wraps a transformer that must never offer more than one alternative.
/// A second alternative means the strategy was put together wrong.
pub struct Singleton {
    inner: Rc<dyn Transformer>,
}

impl Singleton {
    pub fn new(inner: Rc<dyn Transformer>) -> Singleton {
        Singleton { inner }
    }
}

impl fmt::Display for Singleton {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

struct SingletonIter<'a> {
    alternatives: Box<dyn Iterator<Item = VC> + 'a>,
    yielded: bool,
    name: String,
}

impl<'a> Iterator for SingletonIter<'a> {
    type Item = VC;

    fn next(&mut self) -> Option<VC> {
        let alternative = self.alternatives.next()?;
        if self.yielded {
            error!(transformer = %self.name, "singleton transformer produced a second alternative");
            debug_assert!(false, "{} produced more than one alternative", self.name);
            return None;
        }
        self.yielded = true;
        Some(alternative)
    }
}

impl Transformer for Singleton {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        Box::new(SingletonIter {
            alternatives: self.inner.transform(vc),
            yielded: false,
            name: self.inner.to_string(),
        })
    }

    delegate_rule_properties!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::{Simplify, SubstituteInConsequent};

    fn t(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    fn vc(antecedent: &str, consequent: &str) -> VC {
        VC::from_terms("test", &t(antecedent), &t(consequent))
    }

    #[test]
    fn test_productive_drops_no_op_rewrites() {
        let swap: Rc<dyn Transformer> = Rc::new(SubstituteInConsequent::new("ab", t("a"), t("b")));
        let input = vc("p(b)", "and(p(a), p(b))");
        assert_eq!(swap.transform(&input).count(), 1);
        let productive = Productive::new(swap);
        assert_eq!(productive.transform(&input).count(), 1);

        let noop = vc("true", "q(c)");
        assert_eq!(productive.transform(&noop).count(), 0);
    }

    #[test]
    fn test_productive_filters_equivalent_results() {
        let identity: Rc<dyn Transformer> =
            Rc::new(SubstituteInConsequent::new("id", t("forall x. f(x)"), t("forall x. f(x)")));
        let input = vc("true", "p(f(a))");
        assert_eq!(identity.transform(&input).count(), 1);
        assert_eq!(Productive::new(identity).transform(&input).count(), 0);
    }

    #[test]
    fn test_no_backtrack_takes_first_change() {
        let rule: Rc<dyn Transformer> = Rc::new(SubstituteInConsequent::new(
            "zero",
            t("forall x. +(x, 0)"),
            t("forall x. x"),
        ));
        let input = vc("true", "and(p(+(a, 0)), q(+(b, 0)))");
        assert_eq!(rule.transform(&input).count(), 2);
        let committed: Vec<VC> = NoBacktrack::new(rule).transform(&input).collect();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].consequent().to_string(), "p(a) and q(+(b, 0))");
    }

    #[test]
    fn test_singleton_passes_single_alternative() {
        let simplify = Singleton::new(Rc::new(Simplify));
        let results: Vec<VC> = simplify.transform(&vc("true", "true")).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_proved());
        assert_eq!(simplify.key(), "simplify");
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn test_singleton_rejects_second_alternative() {
        let rule = Rc::new(SubstituteInConsequent::new("ab", t("a"), t("b")));
        let singleton = Singleton::new(rule);
        let _ = singleton.transform(&vc("true", "and(p(a), q(a))")).count();
    }
}
