use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::binder::{global_facts, Fact, TotalBinder};
use crate::binding::Binding;
use crate::conjuncts::Antecedent;
use crate::metrics::Interrupt;
use crate::term::Term;
use crate::transformer::combinators::delegate_rule_properties;
use crate::transformer::{leaves_unbound, Transformer};
use crate::vc::VC;

/// Extends the antecedent with an implication A1 and ... and An implies C.
/// Every way to bind all of the Ai against the antecedent plus the global facts adds C under
/// that binding, as long as at least one Ai matched a fact of the VC itself.
/// Derivations from global facts alone belong in the global facts.
pub struct DevelopAntecedent {
    source: String,
    conditions: Vec<Term>,
    conclusion: Term,
    globals: Rc<[Term]>,

    // The implication as one term, for the fitness functions.
    condition_term: Term,
}

impl DevelopAntecedent {
    pub fn new(
        source: &str,
        conditions: Vec<Term>,
        conclusion: Term,
        globals: Rc<[Term]>,
    ) -> DevelopAntecedent {
        let condition_term = Term::conjoin(conditions.clone());
        DevelopAntecedent {
            source: source.to_string(),
            conditions,
            conclusion,
            globals,
            condition_term,
        }
    }

    fn develop(&self, vc: &VC, binding: &Binding) -> Option<VC> {
        let antecedent = vc.antecedent();
        let derived = self.conclusion.substitute(binding);
        let new_facts: Vec<Term> = derived
            .split_into_conjuncts()
            .into_iter()
            .filter(|fact| !antecedent.contains_equivalent(fact))
            .collect();
        if new_facts.is_empty() {
            return None;
        }
        trace!(rule = %self.source, derived = %derived, "developed antecedent");
        Some(vc.with_antecedent(antecedent.append_all(&new_facts)))
    }
}

impl fmt::Display for DevelopAntecedent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "develop antecedent {}: {} => {}",
            self.source, self.condition_term, self.conclusion
        )
    }
}

impl Transformer for DevelopAntecedent {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let mut facts = vc.antecedent().facts();
        facts.extend(global_facts(&self.globals));
        let pool: Rc<[Fact<'a>]> = facts.into();
        Box::new(
            TotalBinder::new(&self.conditions, pool, Binding::new())
                .filter(|m| m.any_local())
                .filter_map(move |m| self.develop(vc, &m.binding)),
        )
    }

    fn pattern(&self) -> Option<&Term> {
        Some(&self.condition_term)
    }

    fn template(&self) -> Option<&Term> {
        Some(&self.conclusion)
    }

    fn introduces_quantified_variables(&self) -> bool {
        let conditions: Vec<&Term> = self.conditions.iter().collect();
        leaves_unbound(&conditions, &self.conclusion)
    }

    // The "and" joining the conditions is never matched against anything.
    fn pattern_symbol_names(&self) -> BTreeSet<String> {
        self.conditions
            .iter()
            .flat_map(|condition| condition.symbol_names())
            .collect()
    }

    fn could_affect_antecedent(&self) -> bool {
        true
    }

    fn could_affect_consequent(&self) -> bool {
        false
    }
}

// The conjuncts of the output antecedent that the input antecedent lacks.
// Steps on the antecedent append or replace in place, so only positions that changed can hold one.
fn added_facts<'a>(before: &Antecedent, after: &'a Antecedent) -> Vec<&'a Term> {
    after
        .iter()
        .enumerate()
        .filter(|(i, fact)| before.get(*i) != Some(*fact))
        .map(|(_, fact)| fact)
        .filter(|fact| !before.contains_equivalent(fact))
        .collect()
}

/// Keeps only developments that mention a symbol the antecedent never mentioned.
/// Stops rules like x = x + 0 from inflating the antecedent forever.
pub struct NewTermsOnly {
    inner: Rc<dyn Transformer>,
}

impl NewTermsOnly {
    pub fn new(inner: Rc<dyn Transformer>) -> NewTermsOnly {
        NewTermsOnly { inner }
    }
}

impl fmt::Display for NewTermsOnly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (new terms only)", self.inner)
    }
}

impl Transformer for NewTermsOnly {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        let known: BTreeSet<String> = vc.antecedent().symbol_names();
        Box::new(self.inner.transform(vc).filter(move |alternative| {
            added_facts(vc.antecedent(), alternative.antecedent())
                .iter()
                .any(|fact| fact.symbol_names().iter().any(|name| !known.contains(name)))
        }))
    }

    delegate_rule_properties!();
}

// Appends the facts an alternative added, unless they are already there.
fn absorb(accumulated: &mut Antecedent, base: &Antecedent, alternative: &VC) -> bool {
    let mut grew = false;
    for fact in added_facts(base, alternative.antecedent()) {
        if !accumulated.contains_equivalent(fact) {
            *accumulated = accumulated.append(fact);
            grew = true;
        }
    }
    grew
}

/// Folds every alternative's new antecedent facts into a single VC.
/// Yields nothing when no alternative added anything, or when interrupted partway.
pub struct Accumulate {
    inner: Rc<dyn Transformer>,
    interrupt: Interrupt,
}

impl Accumulate {
    pub fn new(inner: Rc<dyn Transformer>) -> Accumulate {
        Accumulate {
            inner,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Accumulate {
        self.interrupt = interrupt;
        self
    }

    fn accumulate(&self, vc: &VC) -> Option<VC> {
        let mut accumulated = vc.antecedent().clone();
        let mut grew = false;
        for alternative in self.inner.transform(vc) {
            if self.interrupt.is_triggered() {
                trace!(rule = %self.inner, "accumulation interrupted");
                return None;
            }
            grew |= absorb(&mut accumulated, vc.antecedent(), &alternative);
        }
        if grew {
            Some(vc.with_antecedent(accumulated))
        } else {
            None
        }
    }
}

impl fmt::Display for Accumulate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "all of {}", self.inner)
    }
}

impl Transformer for Accumulate {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        Box::new(std::iter::once(()).filter_map(move |_| self.accumulate(vc)))
    }

    delegate_rule_properties!();
}

/// Runs a whole set of developers for a fixed number of rounds.
/// Each round accumulates every rule against the VC the previous round produced.
/// The interrupt is polled before each rule and each alternative; an interrupted batch yields nothing.
pub struct BatchDevelop {
    rules: Vec<Rc<dyn Transformer>>,
    rounds: usize,
    interrupt: Interrupt,
}

impl BatchDevelop {
    pub fn new(rules: Vec<Rc<dyn Transformer>>, rounds: usize) -> BatchDevelop {
        BatchDevelop {
            rules,
            rounds,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> BatchDevelop {
        self.interrupt = interrupt;
        self
    }

    fn develop(&self, vc: &VC) -> Option<VC> {
        let mut current = vc.clone();
        let mut grew = false;
        for round in 0..self.rounds {
            let mut accumulated = current.antecedent().clone();
            let mut grew_this_round = false;
            for rule in &self.rules {
                if self.interrupt.is_triggered() {
                    trace!(round, rule = %rule, "batch development interrupted");
                    return None;
                }
                for alternative in rule.transform(&current) {
                    if self.interrupt.is_triggered() {
                        trace!(round, rule = %rule, "batch development interrupted");
                        return None;
                    }
                    grew_this_round |= absorb(&mut accumulated, current.antecedent(), &alternative);
                }
            }
            if !grew_this_round {
                trace!(round, "batch development reached a fixed point");
                break;
            }
            grew = true;
            current = current.with_antecedent(accumulated);
        }
        if grew {
            Some(current)
        } else {
            None
        }
    }
}

impl fmt::Display for BatchDevelop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "develop antecedent with {} rules for {} rounds",
            self.rules.len(),
            self.rounds
        )
    }
}

impl Transformer for BatchDevelop {
    fn transform<'a>(&'a self, vc: &'a VC) -> Box<dyn Iterator<Item = VC> + 'a> {
        Box::new(std::iter::once(()).filter_map(move |_| self.develop(vc)))
    }

    fn introduces_quantified_variables(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.introduces_quantified_variables())
    }

    fn could_affect_antecedent(&self) -> bool {
        true
    }

    fn could_affect_consequent(&self) -> bool {
        false
    }
}
