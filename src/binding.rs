use im::OrdMap;
use std::fmt;

use crate::term::{Quantification, Term, Variable};

// A Binding maps quantified variables to the terms that replace them, allowing us to turn a
// general pattern into a specific fact by substitution.
// It is persistent, so the binders can fork it cheaply for every alternative they explore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    map: OrdMap<Variable, Term>,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, term)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", var, term)?;
        }
        write!(f, "}}")
    }
}

impl Binding {
    pub fn new() -> Binding {
        Binding::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.map.get(var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.map.iter()
    }

    /// Binds a variable, or checks that an existing binding agrees.
    pub fn bind_variable(&mut self, var: Variable, term: &Term) -> bool {
        match self.map.get(&var) {
            Some(existing) => existing.equivalent(term),
            None => {
                self.map.insert(var, term.clone());
                true
            }
        }
    }

    /// Merges two bindings. None if they disagree about some variable.
    pub fn unify(&self, other: &Binding) -> Option<Binding> {
        let mut answer = self.clone();
        for (var, term) in other.map.iter() {
            if !answer.bind_variable(var.clone(), term) {
                return None;
            }
        }
        Some(answer)
    }

    /// Whether every quantified variable of the term has a binding.
    pub fn covers(&self, term: &Term) -> bool {
        term.quantified_variables()
            .iter()
            .all(|var| self.map.contains_key(var))
    }

    /// Substitutes bound variables. Unbound variables are kept as they are.
    /// A bound function variable takes the name and quantifier of the term it is bound to.
    pub fn apply(&self, term: &Term) -> Term {
        if let Some(var) = term.variable_key() {
            if let Some(replacement) = self.map.get(&var) {
                if term.is_leaf() {
                    return replacement.clone();
                }
                let args = term.args().iter().map(|arg| self.apply(arg)).collect();
                return Term::new(replacement.name(), args)
                    .with_quantification(replacement.quantification());
            }
        }
        if term.is_leaf() {
            return term.clone();
        }
        term.clone()
            .with_args(term.args().iter().map(|arg| self.apply(arg)).collect())
    }

    // Matches the pattern against the fact, extending this binding.
    // On failure the binding may be partially extended, so callers work on a copy.
    fn match_terms(&mut self, pattern: &Term, fact: &Term) -> bool {
        match pattern.quantification() {
            Quantification::None => {
                if pattern.name() != fact.name()
                    || fact.is_quantified()
                    || pattern.num_args() != fact.num_args()
                {
                    return false;
                }
            }
            quantification => {
                if !pattern.sort_compatible(fact) {
                    return false;
                }
                if quantification == Quantification::Exists && fact.has_quantified() {
                    return false;
                }
                let var = match pattern.variable_key() {
                    Some(var) => var,
                    None => return false,
                };
                if pattern.is_leaf() {
                    return self.bind_variable(var, fact);
                }

                // A function variable binds to the head of the fact.
                if pattern.num_args() != fact.num_args() {
                    return false;
                }
                let head = Term::variable(fact.name(), fact.quantification());
                if !self.bind_variable(var, &head) {
                    return false;
                }
            }
        }

        pattern
            .args()
            .iter()
            .zip(fact.args().iter())
            .all(|(p, f)| self.match_terms(p, f))
    }
}

/// Binds a pattern against a fact, starting from nothing.
pub fn bind(pattern: &Term, fact: &Term) -> Option<Binding> {
    bind_with(pattern, fact, &Binding::new())
}

/// Binds a pattern against a fact, consistently with an assumed partial binding.
pub fn bind_with(pattern: &Term, fact: &Term, assumed: &Binding) -> Option<Binding> {
    let mut binding = assumed.clone();
    if binding.match_terms(pattern, fact) {
        Some(binding)
    } else {
        None
    }
}
