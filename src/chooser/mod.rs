// Strategies. A chooser decides which proof steps to try from a VC, and in what order.
use std::fmt;
use std::rc::Rc;

use crate::metrics::Metrics;
use crate::transformer::Transformer;
use crate::vc::VC;

pub mod combinators;
pub mod fitness_sorted;
pub mod proof_data;

pub use combinators::{
    Concatenation, CycleDetector, DepthTether, FixedFirstStep, ListChooser, NoBacktrackChooser,
    OnlyBefore, SimplifyInterleave,
};
pub use fitness_sorted::FitnessSorted;
pub use proof_data::{Attribute, ProofData, StrategyToken, TokenSource};

/// A candidate next step, with the proof data to continue with if it is taken.
#[derive(Clone)]
pub struct Suggestion {
    pub transformer: Rc<dyn Transformer>,
    pub data: ProofData,

    /// Free-form annotations for the proof trace.
    pub notes: Vec<String>,
}

impl Suggestion {
    pub fn new(transformer: Rc<dyn Transformer>, data: ProofData) -> Suggestion {
        Suggestion {
            transformer,
            data,
            notes: vec![],
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Suggestion {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.transformer)?;
        for note in &self.notes {
            write!(f, " [{}]", note)?;
        }
        Ok(())
    }
}

pub trait Chooser {
    /// The steps to try from this VC, best first.
    /// Called eagerly, so any bookkeeping in the metrics happens right away; the
    /// suggestions themselves are produced lazily.
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a>;

    /// Called once per proof attempt, before the search starts.
    fn preoptimize(&mut self, _vc: &VC) {}
}
