use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::binding::Binding;
use crate::error::Result;
use crate::parser::Parser;

/// The quantifier attached to a single symbol occurrence.
/// Quantifiers are pushed down onto the leaves when a term is parsed, so a term never
/// contains an explicit binder node.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Quantification {
    None,
    ForAll,
    Exists,
}

impl Quantification {
    pub fn flipped(self) -> Quantification {
        match self {
            Quantification::None => Quantification::None,
            Quantification::ForAll => Quantification::Exists,
            Quantification::Exists => Quantification::ForAll,
        }
    }

    /// The prefix used when printing a symbol with this quantification.
    pub fn marker(self) -> &'static str {
        match self {
            Quantification::None => "",
            Quantification::ForAll => "@",
            Quantification::Exists => "?",
        }
    }
}

/// A quantified symbol, identified by name and quantifier.
/// Function variables use the same key as leaf variables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub quantification: Quantification,
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.quantification.marker(), self.name)
    }
}

/// A path from the root of a term to one of its subterms, as argument indices.
pub type Path = Vec<usize>;

pub const AND: &str = "and";
pub const IMPLIES: &str = "implies";
pub const NOT: &str = "not";
pub const EQUALS: &str = "=";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";

/// An immutable expression tree.
/// Each node is a symbol applied to zero or more arguments. Leaves are constants or
/// quantified variables; a quantified node with arguments is a function variable.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    name: String,
    quantification: Quantification,

    /// Only quantified symbols declared with a sort carry one.
    /// Binding refuses to cross two different sorts.
    sort: Option<String>,

    args: Vec<Term>,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.quantification.marker(), self.name)?;
        if let Some(sort) = &self.sort {
            write!(f, ":{}", sort)?;
        }
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl Term {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Term {
        Term {
            name: name.into(),
            quantification: Quantification::None,
            sort: None,
            args,
        }
    }

    pub fn constant(name: impl Into<String>) -> Term {
        Term::new(name, vec![])
    }

    pub fn variable(name: impl Into<String>, quantification: Quantification) -> Term {
        Term {
            name: name.into(),
            quantification,
            sort: None,
            args: vec![],
        }
    }

    pub fn for_all(name: impl Into<String>) -> Term {
        Term::variable(name, Quantification::ForAll)
    }

    pub fn exists(name: impl Into<String>) -> Term {
        Term::variable(name, Quantification::Exists)
    }

    /// Parses the prefix syntax, e.g. "forall x. =(+(x, 0), x)".
    pub fn parse(s: &str) -> Result<Term> {
        Parser::new(s).parse_term()
    }

    pub fn truth() -> Term {
        Term::constant(TRUE)
    }

    pub fn falsity() -> Term {
        Term::constant(FALSE)
    }

    pub fn equals(left: Term, right: Term) -> Term {
        Term::new(EQUALS, vec![left, right])
    }

    pub fn and(left: Term, right: Term) -> Term {
        Term::new(AND, vec![left, right])
    }

    pub fn implies(antecedent: Term, consequent: Term) -> Term {
        Term::new(IMPLIES, vec![antecedent, consequent])
    }

    pub fn not(term: Term) -> Term {
        Term::new(NOT, vec![term])
    }

    /// Joins terms with "and", right-nested. No terms at all is "true".
    pub fn conjoin(mut terms: Vec<Term>) -> Term {
        let mut answer = match terms.pop() {
            Some(last) => last,
            None => return Term::truth(),
        };
        while let Some(term) = terms.pop() {
            answer = Term::and(term, answer);
        }
        answer
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Term {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_quantification(mut self, quantification: Quantification) -> Term {
        self.quantification = quantification;
        self
    }

    pub fn with_args(mut self, args: Vec<Term>) -> Term {
        self.args = args;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantification(&self) -> Quantification {
        self.quantification
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> &Term {
        &self.args[index]
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.args.is_empty()
    }

    /// Whether this node itself carries a quantifier.
    pub fn is_quantified(&self) -> bool {
        self.quantification != Quantification::None
    }

    /// The variable this node stands for, if it is quantified.
    pub fn variable_key(&self) -> Option<Variable> {
        if self.is_quantified() {
            Some(Variable {
                name: self.name.clone(),
                quantification: self.quantification,
            })
        } else {
            None
        }
    }

    /// Whether any node in this term is quantified.
    pub fn has_quantified(&self) -> bool {
        self.is_quantified() || self.args.iter().any(|arg| arg.has_quantified())
    }

    /// Two sorts are compatible unless both are declared and they differ.
    pub fn sort_compatible(&self, other: &Term) -> bool {
        match (&self.sort, &other.sort) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    fn is_named(&self, name: &str, arity: usize) -> bool {
        !self.is_quantified() && self.args.len() == arity && self.name == name
    }

    pub fn is_equality(&self) -> bool {
        self.is_named(EQUALS, 2)
    }

    pub fn is_implication(&self) -> bool {
        self.is_named(IMPLIES, 2)
    }

    pub fn is_conjunction(&self) -> bool {
        self.is_named(AND, 2)
    }

    pub fn is_negation(&self) -> bool {
        self.is_named(NOT, 1)
    }

    pub fn is_literal_true(&self) -> bool {
        self.is_named(TRUE, 0)
    }

    pub fn is_literal_false(&self) -> bool {
        self.is_named(FALSE, 0)
    }

    /// Literal "true", or an equality whose sides are identical.
    pub fn is_obviously_true(&self) -> bool {
        self.is_literal_true() || (self.is_equality() && self.args[0] == self.args[1])
    }

    /// Flattens nested "and" nodes into a list of conjuncts.
    pub fn split_into_conjuncts(&self) -> Vec<Term> {
        let mut answer = vec![];
        self.collect_conjuncts(&mut answer);
        answer
    }

    fn collect_conjuncts(&self, accumulator: &mut Vec<Term>) {
        if self.is_conjunction() {
            self.args[0].collect_conjuncts(accumulator);
            self.args[1].collect_conjuncts(accumulator);
        } else {
            accumulator.push(self.clone());
        }
    }

    /// The names of all unquantified symbols, functions and constants alike.
    pub fn symbol_names(&self) -> BTreeSet<String> {
        let mut answer = BTreeSet::new();
        self.collect_symbol_names(&mut answer);
        answer
    }

    pub(crate) fn collect_symbol_names(&self, accumulator: &mut BTreeSet<String>) {
        if !self.is_quantified() {
            accumulator.insert(self.name.clone());
        }
        for arg in &self.args {
            arg.collect_symbol_names(accumulator);
        }
    }

    pub fn quantified_variables(&self) -> BTreeSet<Variable> {
        let mut answer = BTreeSet::new();
        self.collect_quantified_variables(&mut answer);
        answer
    }

    fn collect_quantified_variables(&self, accumulator: &mut BTreeSet<Variable>) {
        if let Some(v) = self.variable_key() {
            accumulator.insert(v);
        }
        for arg in &self.args {
            arg.collect_quantified_variables(accumulator);
        }
    }

    pub fn contains_existential(&self) -> bool {
        self.quantification == Quantification::Exists
            || self.args.iter().any(|arg| arg.contains_existential())
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.name == name || self.args.iter().any(|arg| arg.contains_name(name))
    }

    /// Every node that applies a function to at least one argument, outermost first.
    pub fn function_applications(&self) -> Vec<&Term> {
        let mut answer = vec![];
        for (_, term) in self.subterms() {
            if !term.is_leaf() {
                answer.push(term);
            }
        }
        answer
    }

    pub fn function_application_count(&self) -> usize {
        let own = if self.is_leaf() { 0 } else { 1 };
        own + self
            .args
            .iter()
            .map(|arg| arg.function_application_count())
            .sum::<usize>()
    }

    /// Swaps "for all" and "there exists" everywhere.
    /// Used when a statement moves across the implication arrow.
    pub fn flip_quantifiers(&self) -> Term {
        Term {
            name: self.name.clone(),
            quantification: self.quantification.flipped(),
            sort: self.sort.clone(),
            args: self.args.iter().map(|arg| arg.flip_quantifiers()).collect(),
        }
    }

    pub fn substitute(&self, binding: &Binding) -> Term {
        binding.apply(self)
    }

    pub fn subterm_at(&self, path: &[usize]) -> Option<&Term> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.args.get(*first)?.subterm_at(rest),
        }
    }

    /// Returns a copy of this term with the subterm at the path replaced.
    /// Panics if the path does not exist, since paths come from walking this same term.
    pub fn replace_at(&self, path: &[usize], replacement: Term) -> Term {
        match path.split_first() {
            None => replacement,
            Some((first, rest)) => {
                let mut args = self.args.clone();
                args[*first] = self.args[*first].replace_at(rest, replacement);
                Term {
                    name: self.name.clone(),
                    quantification: self.quantification,
                    sort: self.sort.clone(),
                    args,
                }
            }
        }
    }

    /// Pre-order, depth-first walk over every subterm, including the term itself.
    pub fn subterms(&self) -> Subterms {
        Subterms {
            stack: vec![(vec![], self)],
        }
    }

    /// Equality up to a consistent, one-to-one renaming of quantified variables.
    pub fn equivalent(&self, other: &Term) -> bool {
        Renaming::default().equivalent(self, other)
    }
}

/// Iterator over (path, subterm) pairs. Holds only a stack, so each step is cheap.
pub struct Subterms<'a> {
    stack: Vec<(Path, &'a Term)>,
}

impl<'a> Iterator for Subterms<'a> {
    type Item = (Path, &'a Term);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, term) = self.stack.pop()?;
        for (i, arg) in term.args.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(i);
            self.stack.push((child_path, arg));
        }
        Some((path, term))
    }
}

#[derive(Default)]
struct Renaming {
    forward: HashMap<Variable, Variable>,
    backward: HashMap<Variable, Variable>,
}

impl Renaming {
    fn link(&mut self, left: Variable, right: Variable) -> bool {
        if left.quantification != right.quantification {
            return false;
        }
        match (self.forward.get(&left), self.backward.get(&right)) {
            (None, None) => {
                self.forward.insert(left.clone(), right.clone());
                self.backward.insert(right, left);
                true
            }
            (Some(r), Some(l)) => *r == right && *l == left,
            _ => false,
        }
    }

    fn equivalent(&mut self, left: &Term, right: &Term) -> bool {
        if left.args.len() != right.args.len() || left.sort != right.sort {
            return false;
        }
        let heads_match = match (left.variable_key(), right.variable_key()) {
            (None, None) => left.name == right.name,
            (Some(l), Some(r)) => self.link(l, r),
            _ => false,
        };
        heads_match
            && left
                .args
                .iter()
                .zip(right.args.iter())
                .all(|(l, r)| self.equivalent(l, r))
    }
}
