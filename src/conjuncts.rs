use im::Vector;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use crate::binder::{Fact, Origin};
use crate::binding::Binding;
use crate::term::Term;

/// Marks which side of the implication a conjunct set lives on.
pub trait Side: Clone + fmt::Debug + Default + PartialEq + Eq {
    const NAME: &'static str;

    fn origin(index: usize) -> Origin;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AntecedentSide;

impl Side for AntecedentSide {
    const NAME: &'static str = "antecedent";

    fn origin(index: usize) -> Origin {
        Origin::Antecedent(index)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConsequentSide;

impl Side for ConsequentSide {
    const NAME: &'static str = "consequent";

    fn origin(index: usize) -> Origin {
        Origin::Consequent(index)
    }
}

/// An ordered, immutable conjunction of terms.
/// Every operation returns a new set; the backing vector shares structure with the old one.
/// Nested "and" terms are always flattened on the way in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Conjuncts<S: Side> {
    terms: Vector<Term>,
    side: PhantomData<S>,
}

/// The facts we get to assume.
pub type Antecedent = Conjuncts<AntecedentSide>;

/// The goals we have to establish.
pub type Consequent = Conjuncts<ConsequentSide>;

impl<S: Side> Default for Conjuncts<S> {
    fn default() -> Self {
        Conjuncts {
            terms: Vector::new(),
            side: PhantomData,
        }
    }
}

impl<S: Side> fmt::Display for Conjuncts<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "true");
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

impl<S: Side> FromIterator<Term> for Conjuncts<S> {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        let mut terms = Vector::new();
        for term in iter {
            for conjunct in term.split_into_conjuncts() {
                terms.push_back(conjunct);
            }
        }
        Conjuncts {
            terms,
            side: PhantomData,
        }
    }
}

impl<S: Side> Conjuncts<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_term(term: &Term) -> Self {
        term.split_into_conjuncts().into_iter().collect()
    }

    fn from_vector(terms: Vector<Term>) -> Self {
        Conjuncts {
            terms,
            side: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    /// Every conjunct as a fact tagged with where it came from.
    pub fn facts(&self) -> Vec<Fact<'_>> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, term)| Fact::new(term, S::origin(i)))
            .collect()
    }

    /// The whole set as a single term.
    pub fn to_term(&self) -> Term {
        Term::conjoin(self.terms.iter().cloned().collect())
    }

    pub fn append(&self, term: &Term) -> Self {
        let mut terms = self.terms.clone();
        for conjunct in term.split_into_conjuncts() {
            terms.push_back(conjunct);
        }
        Self::from_vector(terms)
    }

    pub fn append_all<'a>(&self, new_terms: impl IntoIterator<Item = &'a Term>) -> Self {
        let mut terms = self.terms.clone();
        for term in new_terms {
            for conjunct in term.split_into_conjuncts() {
                terms.push_back(conjunct);
            }
        }
        Self::from_vector(terms)
    }

    /// Panics if the index is out of range.
    pub fn remove(&self, index: usize) -> Self {
        let mut terms = self.terms.clone();
        terms.remove(index);
        Self::from_vector(terms)
    }

    /// Inserts the conjuncts of the term starting at the index.
    pub fn insert(&self, index: usize, term: &Term) -> Self {
        let mut terms = self.terms.clone();
        for (offset, conjunct) in term.split_into_conjuncts().into_iter().enumerate() {
            terms.insert(index + offset, conjunct);
        }
        Self::from_vector(terms)
    }

    /// Replaces the conjunct at the index. A replacement that is itself a conjunction
    /// takes up several slots, in order.
    pub fn set(&self, index: usize, term: &Term) -> Self {
        self.remove(index).insert(index, term)
    }

    pub fn substitute(&self, binding: &Binding) -> Self {
        if binding.is_empty() {
            return self.clone();
        }
        self.terms.iter().map(|term| term.substitute(binding)).collect()
    }

    pub fn retain(&self, mut keep: impl FnMut(&Term) -> bool) -> Self {
        let mut terms = self.terms.clone();
        terms.retain(|term| keep(term));
        Self::from_vector(terms)
    }

    pub fn eliminate_obviously_true(&self) -> Self {
        self.retain(|term| !term.is_obviously_true())
    }

    /// Drops every conjunct equivalent to an earlier one. Idempotent.
    pub fn eliminate_redundant(&self) -> Self {
        let mut kept: Vector<Term> = Vector::new();
        for term in self.terms.iter() {
            if !kept.iter().any(|k| k.equivalent(term)) {
                kept.push_back(term.clone());
            }
        }
        Self::from_vector(kept)
    }

    pub fn index_of_equivalent(&self, term: &Term) -> Option<usize> {
        self.terms.iter().position(|t| t.equivalent(term))
    }

    pub fn contains_equivalent(&self, term: &Term) -> bool {
        self.index_of_equivalent(term).is_some()
    }

    pub fn symbol_names(&self) -> BTreeSet<String> {
        let mut answer = BTreeSet::new();
        for term in self.terms.iter() {
            term.collect_symbol_names(&mut answer);
        }
        answer
    }

    pub fn function_application_count(&self) -> usize {
        self.terms
            .iter()
            .map(|term| term.function_application_count())
            .sum()
    }

    /// Order-insensitive comparison: each side's conjuncts all appear, up to renaming,
    /// on the other side.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.terms.iter().all(|t| other.contains_equivalent(t))
            && other.terms.iter().all(|t| self.contains_equivalent(t))
    }
}
