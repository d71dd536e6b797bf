use std::fmt;

use crate::conjuncts::{Antecedent, Consequent};
use crate::term::Term;

/// An immutable verification condition: the antecedent implies the consequent.
/// Proof steps never edit a VC; they build a derived one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VC {
    name: String,

    /// Set on every VC that was produced by a proof step rather than handed to us.
    derived: bool,

    antecedent: Antecedent,
    consequent: Consequent,
}

impl fmt::Display for VC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "========== {} ==========", self.name())?;
        for term in self.antecedent.iter() {
            writeln!(f, "  {}", term)?;
        }
        writeln!(f, "-->")?;
        for term in self.consequent.iter() {
            writeln!(f, "  {}", term)?;
        }
        Ok(())
    }
}

impl VC {
    pub fn new(name: impl Into<String>, antecedent: Antecedent, consequent: Consequent) -> VC {
        VC {
            name: name.into(),
            derived: false,
            antecedent,
            consequent,
        }
    }

    /// Builds a VC from the raw expressions a VC generator hands us.
    pub fn from_terms(name: impl Into<String>, antecedent: &Term, consequent: &Term) -> VC {
        VC::new(
            name,
            Antecedent::from_term(antecedent),
            Consequent::from_term(consequent),
        )
    }

    /// The human-readable name, marked when this VC came out of a proof step.
    pub fn name(&self) -> String {
        if self.derived {
            format!("{} (modified)", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn source_name(&self) -> &str {
        &self.name
    }

    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub fn antecedent(&self) -> &Antecedent {
        &self.antecedent
    }

    pub fn consequent(&self) -> &Consequent {
        &self.consequent
    }

    pub fn with_antecedent(&self, antecedent: Antecedent) -> VC {
        VC {
            name: self.name.clone(),
            derived: true,
            antecedent,
            consequent: self.consequent.clone(),
        }
    }

    pub fn with_consequent(&self, consequent: Consequent) -> VC {
        VC {
            name: self.name.clone(),
            derived: true,
            antecedent: self.antecedent.clone(),
            consequent,
        }
    }

    pub fn with_both(&self, antecedent: Antecedent, consequent: Consequent) -> VC {
        VC {
            name: self.name.clone(),
            derived: true,
            antecedent,
            consequent,
        }
    }

    /// A VC is proved once there is nothing left to establish.
    pub fn is_proved(&self) -> bool {
        self.consequent.is_empty()
    }

    /// Whether the antecedent contradicts itself: it states false, or states
    /// something alongside its negation.
    pub fn is_inconsistent(&self) -> bool {
        self.antecedent.iter().any(|term| {
            term.is_literal_false()
                || (term.is_negation() && self.antecedent.contains_equivalent(term.arg(0)))
        })
    }

    pub fn equivalent(&self, other: &VC) -> bool {
        self.antecedent.equivalent(&other.antecedent)
            && self.consequent.equivalent(&other.consequent)
    }

    pub fn function_application_count(&self) -> usize {
        self.antecedent.function_application_count() + self.consequent.function_application_count()
    }
}
