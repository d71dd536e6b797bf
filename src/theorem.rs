use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::term::Term;
use crate::transformer::{
    ConsequentWeakening, DevelopAntecedent, ExpandAntecedentBySubstitution,
    SubstituteInAntecedent, SubstituteInConsequent, Transformer,
};

/// A named statement we get to use: an axiom, a definition, or a proved lemma.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theorem {
    pub name: String,
    pub assertion: Term,
}

impl Theorem {
    pub fn new(name: impl Into<String>, assertion: Term) -> Theorem {
        Theorem {
            name: name.into(),
            assertion,
        }
    }

    pub fn parse(name: impl Into<String>, statement: &str) -> Result<Theorem> {
        Ok(Theorem::new(name, Term::parse(statement)?))
    }
}

impl fmt::Display for Theorem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.assertion)
    }
}

/// Which proof steps get derived from each theorem.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Equalities also add rewritten copies of antecedent facts.
    pub antecedent_expansion: bool,

    /// Equalities also rewrite antecedent facts in place.
    pub antecedent_rewriting: bool,

    /// Implications also work backwards from the goals.
    pub consequent_weakening: bool,

    /// Log every theorem that gets skipped.
    pub noisy: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            antecedent_expansion: false,
            antecedent_rewriting: false,
            consequent_weakening: true,
            noisy: false,
        }
    }
}

/// Turns a theorem into proof steps, or explains why it can't.
pub trait RuleNormalizer {
    fn normalize(&self, theorem: &Theorem, globals: &Rc<[Term]>) -> Result<Vec<Rc<dyn Transformer>>>;
}

/// An equality L = R rewrites in both directions.
pub struct EqualityNormalizer {
    config: NormalizerConfig,
}

impl EqualityNormalizer {
    pub fn new(config: NormalizerConfig) -> EqualityNormalizer {
        EqualityNormalizer { config }
    }
}

impl RuleNormalizer for EqualityNormalizer {
    fn normalize(&self, theorem: &Theorem, _globals: &Rc<[Term]>) -> Result<Vec<Rc<dyn Transformer>>> {
        let assertion = &theorem.assertion;
        if !assertion.is_equality() {
            return Err(Error::UnsupportedTheorem(format!(
                "{} is not an equality",
                theorem
            )));
        }

        let (left, right) = (assertion.arg(0), assertion.arg(1));
        let mut answer: Vec<Rc<dyn Transformer>> = vec![];
        for (pattern, template) in [(left, right), (right, left)] {
            // A bare variable matches every subterm of every VC.
            if pattern.is_quantified() && pattern.is_leaf() {
                trace!(theorem = %theorem.name, pattern = %pattern, "skipping direction");
                continue;
            }
            answer.push(Rc::new(SubstituteInConsequent::new(
                &theorem.name,
                pattern.clone(),
                template.clone(),
            )));
            if self.config.antecedent_expansion {
                answer.push(Rc::new(ExpandAntecedentBySubstitution::new(
                    &theorem.name,
                    pattern.clone(),
                    template.clone(),
                )));
            }
            if self.config.antecedent_rewriting {
                answer.push(Rc::new(SubstituteInAntecedent::new(
                    &theorem.name,
                    pattern.clone(),
                    template.clone(),
                )));
            }
        }
        if answer.is_empty() {
            return Err(Error::UnsupportedTheorem(format!(
                "{} has a bare variable on both sides",
                theorem
            )));
        }
        Ok(answer)
    }
}

/// An implication develops the antecedent forwards, and optionally weakens goals backwards.
pub struct ImplicationNormalizer {
    config: NormalizerConfig,
}

impl ImplicationNormalizer {
    pub fn new(config: NormalizerConfig) -> ImplicationNormalizer {
        ImplicationNormalizer { config }
    }
}

impl RuleNormalizer for ImplicationNormalizer {
    fn normalize(&self, theorem: &Theorem, globals: &Rc<[Term]>) -> Result<Vec<Rc<dyn Transformer>>> {
        let assertion = &theorem.assertion;
        if !assertion.is_implication() {
            return Err(Error::UnsupportedTheorem(format!(
                "{} is not an implication",
                theorem
            )));
        }

        let (hypothesis, conclusion) = (assertion.arg(0), assertion.arg(1));
        let mut answer: Vec<Rc<dyn Transformer>> = vec![Rc::new(DevelopAntecedent::new(
            &theorem.name,
            hypothesis.split_into_conjuncts(),
            conclusion.clone(),
            globals.clone(),
        ))];
        if self.config.consequent_weakening {
            answer.push(Rc::new(ConsequentWeakening::new(
                &theorem.name,
                hypothesis.clone(),
                conclusion,
            )));
        }
        Ok(answer)
    }
}

/// The proof steps derived from a list of theorems.
/// Every theorem, usable as a rule or not, is also a global fact.
pub struct RuleLibrary {
    transformers: Vec<Rc<dyn Transformer>>,
    global_facts: Rc<[Term]>,

    /// Why each skipped theorem was skipped.
    diagnostics: Vec<Error>,
}

impl RuleLibrary {
    pub fn new(theorems: &[Theorem], config: &NormalizerConfig) -> RuleLibrary {
        let global_facts: Rc<[Term]> = theorems
            .iter()
            .map(|theorem| theorem.assertion.clone())
            .collect::<Vec<_>>()
            .into();
        let normalizers: Vec<Box<dyn RuleNormalizer>> = vec![
            Box::new(EqualityNormalizer::new(config.clone())),
            Box::new(ImplicationNormalizer::new(config.clone())),
        ];

        let mut transformers = vec![];
        let mut diagnostics = vec![];
        for theorem in theorems {
            let mut rejection = None;
            for normalizer in &normalizers {
                match normalizer.normalize(theorem, &global_facts) {
                    Ok(rules) => {
                        transformers.extend(rules);
                        rejection = None;
                        break;
                    }
                    Err(e) => rejection = Some(e),
                }
            }
            if let Some(e) = rejection {
                if config.noisy {
                    warn!(theorem = %theorem.name, "skipping theorem: {}", e);
                }
                diagnostics.push(e);
            }
        }

        RuleLibrary {
            transformers,
            global_facts,
            diagnostics,
        }
    }

    pub fn transformers(&self) -> &[Rc<dyn Transformer>] {
        &self.transformers
    }

    /// The rules that only work on the antecedent. Batch development folds in whatever they add.
    pub fn developers(&self) -> Vec<Rc<dyn Transformer>> {
        self.transformers
            .iter()
            .filter(|rule| rule.could_affect_antecedent() && !rule.could_affect_consequent())
            .cloned()
            .collect()
    }

    pub fn global_facts(&self) -> &Rc<[Term]> {
        &self.global_facts
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }
}
