use std::fmt;

use crate::vc::VC;

/// One applied transformation and the VC it produced.
#[derive(Clone, Debug)]
pub struct ProofStep {
    pub description: String,
    pub notes: Vec<String>,
    pub vc: VC,
}

/// A human-readable trace of a successful search, from the original VC to an empty consequent.
#[derive(Clone, Debug)]
pub struct Proof {
    pub vc: VC,

    // In the order they were applied.
    steps: Vec<ProofStep>,
}

impl Proof {
    pub fn new(vc: VC, steps: Vec<ProofStep>) -> Proof {
        Proof { vc, steps }
    }

    pub fn steps(&self) -> &[ProofStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.description.clone()).collect()
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.vc)?;
        if self.steps.is_empty() {
            return writeln!(f, "(proved by simplification)");
        }
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "step {}: {}", i + 1, step.description)?;
            for note in &step.notes {
                write!(f, " [{}]", note)?;
            }
            writeln!(f)?;
            write!(f, "{}", step.vc)?;
        }
        Ok(())
    }
}
