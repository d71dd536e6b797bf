use std::fmt;

use crate::binding::{bind, Binding};
use crate::conjuncts::{Conjuncts, Side};
use crate::term::{Path, Subterms, Term};
use crate::transformer::{leaves_unbound, Transformer};
use crate::vc::VC;

/// A place where a pattern matched.
#[derive(Clone, Debug)]
pub struct Site {
    /// Which conjunct.
    pub index: usize,

    /// Where inside that conjunct.
    pub path: Path,

    pub binding: Binding,
}

/// Walks each conjunct of a set depth-first, yielding every site where the pattern binds.
/// Moves on to the next conjunct once the current one is exhausted.
pub struct ReplacementSuggester<'a, S: Side> {
    pattern: &'a Term,
    conjuncts: &'a Conjuncts<S>,
    index: usize,
    walk: Option<Subterms<'a>>,
}

impl<'a, S: Side> ReplacementSuggester<'a, S> {
    pub fn new(pattern: &'a Term, conjuncts: &'a Conjuncts<S>) -> Self {
        ReplacementSuggester {
            pattern,
            conjuncts,
            index: 0,
            walk: None,
        }
    }
}

impl<'a, S: Side> Iterator for ReplacementSuggester<'a, S> {
    type Item = Site;

    fn next(&mut self) -> Option<Site> {
        loop {
            if self.walk.is_none() {
                let conjunct = self.conjuncts.get(self.index)?;
                self.walk = Some(conjunct.subterms());
            }
            if let Some(walk) = self.walk.as_mut() {
                for (path, subterm) in walk.by_ref() {
                    if let Some(binding) = bind(self.pattern, subterm) {
                        return Some(Site {
                            index: self.index,
                            path,
                            binding,
                        });
                    }
                }
            }
            self.walk = None;
            self.index += 1;
        }
    }
}

// One direction of an equality, shared by the substitution steps.
struct Rewrite {
    source: String,
    pattern: Term,
    template: Term,
}

impl Rewrite {
    fn new(source: &str, pattern: Term, template: Term) -> Rewrite {
        Rewrite {
            source: source.to_string(),
            pattern,
            template,
        }
    }

    // The conjunct at the site, rewritten.
    fn apply<S: Side>(&self, conjuncts: &Conjuncts<S>, site: &Site) -> Option<Term> {
        let conjunct = conjuncts.get(site.index)?;
        let replacement = self.template.substitute(&site.binding);
        Some(conjunct.replace_at(&site.path, replacement))
    }

    fn delta(&self) -> i64 {
        self.template.function_application_count() as i64
            - self.pattern.function_application_count() as i64
    }

    fn introduces_quantified_variables(&self) -> bool {
        leaves_unbound(&[&self.pattern], &self.template)
    }

    fn describe(&self, f: &mut fmt::Formatter, place: &str) -> fmt::Result {
        write!(
            f,
            "{} {}: {} => {}",
            place, self.source, self.pattern, self.template
        )
    }
}

/// Rewrites one site of the consequent. Yields one alternative per match site.
pub struct SubstituteInConsequent {
    rewrite: Rewrite,
}

impl SubstituteInConsequent {
    pub fn new(source: &str, pattern: Term, template: Term) -> SubstituteInConsequent {
        SubstituteInConsequent {
            rewrite: Rewrite::new(source, pattern, template),
        }
    }
}

impl fmt::Display for SubstituteInConsequent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.rewrite.describe(f, "substitute in consequent")
    }
}

impl Transformer for SubstituteInConsequent {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let consequent = vc.consequent();
        Box::new(
            ReplacementSuggester::new(&self.rewrite.pattern, consequent).filter_map(move |site| {
                let rewritten = self.rewrite.apply(consequent, &site)?;
                Some(vc.with_consequent(consequent.set(site.index, &rewritten)))
            }),
        )
    }

    fn pattern(&self) -> Option<&Term> {
        Some(&self.rewrite.pattern)
    }

    fn template(&self) -> Option<&Term> {
        Some(&self.rewrite.template)
    }

    fn introduces_quantified_variables(&self) -> bool {
        self.rewrite.introduces_quantified_variables()
    }

    fn function_application_delta(&self) -> i64 {
        self.rewrite.delta()
    }

    fn could_affect_antecedent(&self) -> bool {
        false
    }

    fn could_affect_consequent(&self) -> bool {
        true
    }
}

/// Rewrites one site of the antecedent, replacing the conjunct it sits in.
pub struct SubstituteInAntecedent {
    rewrite: Rewrite,
}

impl SubstituteInAntecedent {
    pub fn new(source: &str, pattern: Term, template: Term) -> SubstituteInAntecedent {
        SubstituteInAntecedent {
            rewrite: Rewrite::new(source, pattern, template),
        }
    }
}

impl fmt::Display for SubstituteInAntecedent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.rewrite.describe(f, "substitute in antecedent")
    }
}

impl Transformer for SubstituteInAntecedent {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let antecedent = vc.antecedent();
        Box::new(
            ReplacementSuggester::new(&self.rewrite.pattern, antecedent).filter_map(move |site| {
                let rewritten = self.rewrite.apply(antecedent, &site)?;
                Some(vc.with_antecedent(antecedent.set(site.index, &rewritten)))
            }),
        )
    }

    fn pattern(&self) -> Option<&Term> {
        Some(&self.rewrite.pattern)
    }

    fn template(&self) -> Option<&Term> {
        Some(&self.rewrite.template)
    }

    fn introduces_quantified_variables(&self) -> bool {
        self.rewrite.introduces_quantified_variables()
    }

    fn function_application_delta(&self) -> i64 {
        self.rewrite.delta()
    }

    fn could_affect_antecedent(&self) -> bool {
        true
    }

    fn could_affect_consequent(&self) -> bool {
        false
    }
}

/// Like substitution in the antecedent, but the rewritten conjunct is added as a new fact
/// and the original stays.
pub struct ExpandAntecedentBySubstitution {
    rewrite: Rewrite,
}

impl ExpandAntecedentBySubstitution {
    pub fn new(source: &str, pattern: Term, template: Term) -> ExpandAntecedentBySubstitution {
        ExpandAntecedentBySubstitution {
            rewrite: Rewrite::new(source, pattern, template),
        }
    }
}

impl fmt::Display for ExpandAntecedentBySubstitution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.rewrite.describe(f, "expand antecedent")
    }
}

impl Transformer for ExpandAntecedentBySubstitution {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let antecedent = vc.antecedent();
        Box::new(
            ReplacementSuggester::new(&self.rewrite.pattern, antecedent).filter_map(move |site| {
                let rewritten = self.rewrite.apply(antecedent, &site)?;
                if antecedent.contains_equivalent(&rewritten) {
                    return None;
                }
                Some(vc.with_antecedent(antecedent.append(&rewritten)))
            }),
        )
    }

    fn pattern(&self) -> Option<&Term> {
        Some(&self.rewrite.pattern)
    }

    fn template(&self) -> Option<&Term> {
        Some(&self.rewrite.template)
    }

    fn introduces_quantified_variables(&self) -> bool {
        self.rewrite.introduces_quantified_variables()
    }

    fn function_application_delta(&self) -> i64 {
        // The antecedent only grows; the goals stay the same size.
        0
    }

    fn could_affect_antecedent(&self) -> bool {
        true
    }

    fn could_affect_consequent(&self) -> bool {
        false
    }
}
