use std::rc::Rc;

use crate::binding::{bind_with, Binding};
use crate::conjuncts::{Conjuncts, Side};
use crate::term::Term;

/// Where a fact came from.
/// Local facts belong to the VC being proved; global facts are background theorems.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    Antecedent(usize),
    Consequent(usize),
    Global(usize),
}

impl Origin {
    pub fn is_local(self) -> bool {
        !matches!(self, Origin::Global(_))
    }

    pub fn index(self) -> usize {
        match self {
            Origin::Antecedent(i) | Origin::Consequent(i) | Origin::Global(i) => i,
        }
    }
}

/// A candidate term to bind patterns against.
#[derive(Clone, Copy, Debug)]
pub struct Fact<'a> {
    pub term: &'a Term,
    pub origin: Origin,
}

impl<'a> Fact<'a> {
    pub fn new(term: &'a Term, origin: Origin) -> Fact<'a> {
        Fact { term, origin }
    }
}

/// Tags background theorems as global facts.
pub fn global_facts(terms: &[Term]) -> Vec<Fact<'_>> {
    terms
        .iter()
        .enumerate()
        .map(|(i, term)| Fact::new(term, Origin::Global(i)))
        .collect()
}

/// One way a single pattern binds.
#[derive(Clone, Debug)]
pub struct Match {
    pub binding: Binding,
    pub origin: Origin,
}

/// Binds one pattern against a lazy sequence of facts.
/// Facts that fail to bind are skipped; every fact that binds yields exactly one match.
pub struct IncrementalBinder<'a, I> {
    pattern: &'a Term,
    facts: I,
    assumed: Binding,
}

impl<'a, I: Iterator<Item = Fact<'a>>> IncrementalBinder<'a, I> {
    pub fn new(pattern: &'a Term, facts: I, assumed: Binding) -> Self {
        IncrementalBinder {
            pattern,
            facts,
            assumed,
        }
    }
}

impl<'a, I: Iterator<Item = Fact<'a>>> Iterator for IncrementalBinder<'a, I> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        for fact in self.facts.by_ref() {
            if let Some(binding) = bind_with(self.pattern, fact.term, &self.assumed) {
                return Some(Match {
                    binding,
                    origin: fact.origin,
                });
            }
        }
        None
    }
}

// Walks a shared fact pool from the start, skipping facts already consumed.
struct PoolIter<'a> {
    facts: Rc<[Fact<'a>]>,
    position: usize,
    skip: Vec<Origin>,
}

impl<'a> Iterator for PoolIter<'a> {
    type Item = Fact<'a>;

    fn next(&mut self) -> Option<Fact<'a>> {
        while let Some(fact) = self.facts.get(self.position) {
            self.position += 1;
            if !self.skip.contains(&fact.origin) {
                return Some(*fact);
            }
        }
        None
    }
}

/// A binding that covers a whole list of patterns, along with the fact each pattern matched.
#[derive(Clone, Debug)]
pub struct TotalMatch {
    pub binding: Binding,

    /// One origin per pattern, in pattern order.
    pub origins: Vec<Origin>,
}

impl TotalMatch {
    pub fn any_local(&self) -> bool {
        self.origins.iter().any(|origin| origin.is_local())
    }
}

/// Binds an ordered list of patterns against a fact pool.
/// The first pattern is bound incrementally, then the rest are bound recursively under
/// each partial binding. With no patterns at all, the assumed binding is the only match.
pub struct TotalBinder<'a> {
    state: State<'a>,
}

enum State<'a> {
    Done,
    Identity(Binding),
    Searching(Box<Search<'a>>),
}

struct Search<'a> {
    rest_patterns: &'a [Term],
    pool: Rc<[Fact<'a>]>,
    distinct: bool,
    used: Vec<Origin>,
    first: IncrementalBinder<'a, PoolIter<'a>>,
    rest: Option<(Origin, TotalBinder<'a>)>,
}

impl<'a> Search<'a> {
    fn next_match(&mut self) -> Option<TotalMatch> {
        loop {
            if let Some((origin, rest)) = &mut self.rest {
                if let Some(m) = rest.next() {
                    let mut origins = Vec::with_capacity(m.origins.len() + 1);
                    origins.push(*origin);
                    origins.extend(m.origins);
                    return Some(TotalMatch {
                        binding: m.binding,
                        origins,
                    });
                }
                self.rest = None;
            }

            let first = self.first.next()?;
            let mut used = self.used.clone();
            if self.distinct {
                used.push(first.origin);
            }
            let rest = TotalBinder::build(
                self.rest_patterns,
                self.pool.clone(),
                first.binding,
                self.distinct,
                used,
            );
            self.rest = Some((first.origin, rest));
        }
    }
}

impl<'a> TotalBinder<'a> {
    pub fn new(patterns: &'a [Term], pool: Rc<[Fact<'a>]>, assumed: Binding) -> Self {
        TotalBinder::build(patterns, pool, assumed, false, vec![])
    }

    fn build(
        patterns: &'a [Term],
        pool: Rc<[Fact<'a>]>,
        assumed: Binding,
        distinct: bool,
        used: Vec<Origin>,
    ) -> Self {
        let state = match patterns.split_first() {
            None => State::Identity(assumed),
            Some((first, rest_patterns)) => {
                let facts = PoolIter {
                    facts: pool.clone(),
                    position: 0,
                    skip: used.clone(),
                };
                State::Searching(Box::new(Search {
                    rest_patterns,
                    pool,
                    distinct,
                    used,
                    first: IncrementalBinder::new(first, facts, assumed),
                    rest: None,
                }))
            }
        };
        TotalBinder { state }
    }
}

impl<'a> Iterator for TotalBinder<'a> {
    type Item = TotalMatch;

    fn next(&mut self) -> Option<TotalMatch> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Done => None,
            State::Identity(binding) => Some(TotalMatch {
                binding,
                origins: vec![],
            }),
            State::Searching(mut search) => {
                let answer = search.next_match();
                if answer.is_some() {
                    self.state = State::Searching(search);
                }
                answer
            }
        }
    }
}

/// A match of several patterns against distinct conjuncts of one set.
#[derive(Clone, Debug)]
pub struct ConjunctMatch {
    pub binding: Binding,

    /// The conjunct index each pattern consumed, in pattern order.
    pub consumed: Vec<usize>,

    /// The indices of the conjuncts no pattern consumed, in order.
    pub remaining: Vec<usize>,
}

/// Binds patterns against the conjuncts of a single set, one conjunct per pattern.
pub struct ConjunctBinder<'a> {
    inner: TotalBinder<'a>,
    count: usize,
}

impl<'a> ConjunctBinder<'a> {
    pub fn new<S: Side>(
        patterns: &'a [Term],
        conjuncts: &'a Conjuncts<S>,
        assumed: Binding,
    ) -> ConjunctBinder<'a> {
        let pool: Rc<[Fact<'a>]> = conjuncts.facts().into();
        ConjunctBinder {
            inner: TotalBinder::build(patterns, pool, assumed, true, vec![]),
            count: conjuncts.len(),
        }
    }
}

impl<'a> Iterator for ConjunctBinder<'a> {
    type Item = ConjunctMatch;

    fn next(&mut self) -> Option<ConjunctMatch> {
        let m = self.inner.next()?;
        let consumed: Vec<usize> = m.origins.iter().map(|origin| origin.index()).collect();
        let remaining = (0..self.count).filter(|i| !consumed.contains(i)).collect();
        Some(ConjunctMatch {
            binding: m.binding,
            consumed,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conjuncts::{Antecedent, Consequent};

    fn t(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    fn terms(list: &[&str]) -> Vec<Term> {
        list.iter().map(|s| t(s)).collect()
    }

    #[test]
    fn test_incremental_binder_skips_failures() {
        let facts = terms(&["p(a)", "q(b)", "p(c)", "p(d, e)"]);
        let pattern = t("forall x. p(x)");
        let binder = IncrementalBinder::new(
            &pattern,
            global_facts(&facts).into_iter(),
            Binding::new(),
        );
        let origins: Vec<Origin> = binder.map(|m| m.origin).collect();
        assert_eq!(origins, vec![Origin::Global(0), Origin::Global(2)]);
    }

    #[test]
    fn test_total_binder_with_no_patterns_yields_assumed() {
        let facts = terms(&["p(a)"]);
        let pool: Rc<[Fact]> = global_facts(&facts).into();
        let matches: Vec<TotalMatch> = TotalBinder::new(&[], pool, Binding::new()).collect();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].binding.is_empty());
        assert!(matches[0].origins.is_empty());
    }

    #[test]
    fn test_total_binder_keeps_bindings_consistent() {
        let facts = terms(&["p(a)", "p(b)", "q(b)", "q(c)"]);
        let pool: Rc<[Fact]> = global_facts(&facts).into();
        let patterns = terms(&["forall x. p(x)", "forall x. q(x)"]);
        let matches: Vec<TotalMatch> = TotalBinder::new(&patterns, pool, Binding::new()).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].binding.to_string(), "{@x -> b}");
        assert_eq!(
            matches[0].origins,
            vec![Origin::Global(1), Origin::Global(2)]
        );
    }

    #[test]
    fn test_total_binder_is_exhaustive() {
        let facts = terms(&["p(a)", "p(b)", "q(c)", "q(d)"]);
        let pool: Rc<[Fact]> = global_facts(&facts).into();
        let patterns = terms(&["forall x. p(x)", "forall y. q(y)"]);
        let bindings: Vec<String> = TotalBinder::new(&patterns, pool, Binding::new())
            .map(|m| m.binding.to_string())
            .collect();
        assert_eq!(
            bindings,
            vec![
                "{@x -> a, @y -> c}",
                "{@x -> a, @y -> d}",
                "{@x -> b, @y -> c}",
                "{@x -> b, @y -> d}",
            ]
        );
    }

    #[test]
    fn test_total_binder_mixes_local_and_global() {
        let antecedent = Antecedent::from_term(&t(">(a, 0)"));
        let globals = terms(&["<=(+(a, b), c)"]);
        let mut facts = antecedent.facts();
        facts.extend(global_facts(&globals));
        let pool: Rc<[Fact]> = facts.into();
        let patterns = terms(&["forall i. >(i, 0)", "forall i, j, k. <=(+(i, j), k)"]);
        let matches: Vec<TotalMatch> = TotalBinder::new(&patterns, pool, Binding::new()).collect();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].any_local());
        assert_eq!(
            matches[0].origins,
            vec![Origin::Antecedent(0), Origin::Global(0)]
        );
    }

    #[test]
    fn test_conjunct_binder_uses_distinct_conjuncts() {
        let consequent = Consequent::from_term(&t("and(p(a), and(r, p(b)))"));
        let patterns = terms(&["forall x. p(x)", "forall y. p(y)"]);
        let matches: Vec<ConjunctMatch> =
            ConjunctBinder::new(&patterns, &consequent, Binding::new()).collect();
        let consumed: Vec<Vec<usize>> = matches.iter().map(|m| m.consumed.clone()).collect();
        assert_eq!(consumed, vec![vec![0, 2], vec![2, 0]]);
        assert!(matches.iter().all(|m| m.remaining == vec![1]));
    }
}
